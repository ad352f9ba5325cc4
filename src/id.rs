//! Code for handling IDs
use anyhow::Result;
use indexmap::IndexSet;

/// A trait alias for ID types
pub trait IDLike:
    Eq + std::hash::Hash + std::borrow::Borrow<str> + Clone + std::fmt::Display + std::fmt::Debug
{
}
impl<T> IDLike for T where
    T: Eq + std::hash::Hash + std::borrow::Borrow<str> + Clone + std::fmt::Display + std::fmt::Debug
{
}

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone,
            std::hash::Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            serde::Deserialize,
            serde::Serialize,
            derive_more::Display,
        )]
        #[serde(transparent)]
        /// An ID type (e.g. `SiteID`, `SegmentID`, etc.)
        pub struct $name(pub std::rc::Rc<str>);

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:?}", &*self.0)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::rc::Rc::from(id))
            }
        }
    };
}
pub(crate) use define_id_type;

/// Collect IDs into an ordered set, failing on the first duplicate.
///
/// `kind` names the collection in the error message (e.g. "segment").
pub fn collect_unique_ids<ID, I>(ids: I, kind: &str) -> Result<IndexSet<ID>>
where
    ID: IDLike,
    I: IntoIterator<Item = ID>,
{
    let mut set = IndexSet::new();
    for id in ids {
        let id_str: &str = id.borrow();
        anyhow::ensure!(!id_str.is_empty(), "Empty {kind} ID");
        if let Some(dup) = set.replace(id) {
            anyhow::bail!("Duplicate {kind} ID: {dup}");
        }
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    define_id_type!(GenericID);

    #[test]
    fn test_collect_unique_ids() {
        let ids: IndexSet<GenericID> =
            collect_unique_ids(["x".into(), "y".into()], "generic").unwrap();
        assert_eq!(ids.len(), 2);

        let err = collect_unique_ids::<GenericID, _>(["x".into(), "x".into()], "generic")
            .unwrap_err();
        assert_eq!(err.to_string(), "Duplicate generic ID: x");

        assert!(collect_unique_ids::<GenericID, _>(["".into()], "generic").is_err());
    }

    #[test]
    fn test_id_display_and_debug() {
        let id = GenericID::new("Copiapó");
        assert_eq!(id.to_string(), "Copiapó");
        assert_eq!(format!("{id:?}"), "\"Copiapó\"");
    }
}
