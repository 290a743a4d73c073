mod provisioner;

pub use provisioner::*;
