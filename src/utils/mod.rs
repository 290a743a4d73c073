use uuid::Uuid;

/// Container group names must be unique per resource group; a fresh UUID per
/// request keeps concurrent provisions apart.
pub fn instance_name() -> String {
    format!("cs2-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_valid_for_aci() {
        let first = instance_name();
        let second = instance_name();

        assert_ne!(first, second);
        assert!(first.len() <= 63);
        assert!(first
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }
}
