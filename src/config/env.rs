#[cfg(test)]
use ahash::AHashMap;

/// Source of process-level variables. Injected so the provisioner can be
/// exercised without touching the real process environment.
pub trait Environment: Send + Sync {
    /// Returns the variable, treating an empty value as unset.
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads from the process environment (and whatever `.env` loaded into it).
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        dotenvy::var(key).ok().filter(|value| !value.is_empty())
    }
}

/// Fixed set of variables.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment(AHashMap<String, String>);

#[cfg(test)]
impl<K, V> FromIterator<(K, V)> for StaticEnvironment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
impl Environment for StaticEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.0.get(key).filter(|value| !value.is_empty()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_environment_treats_empty_as_unset() {
        let env: StaticEnvironment = [("A", "1"), ("B", "")].into_iter().collect();

        assert_eq!(env.var("A").as_deref(), Some("1"));
        assert_eq!(env.var("B"), None);
        assert_eq!(env.var("C"), None);
    }
}
