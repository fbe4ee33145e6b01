use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Ordered integer sequence that uniquely addresses a node within one provider
/// session. Its JSON form (`[42,7,1]`) is what snapshots embed as `id`.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeId(Vec<i32>);

impl RuntimeId {
    pub fn new(parts: impl Into<Vec<i32>>) -> Self {
        Self(parts.into())
    }

    pub fn parts(&self) -> &[i32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses the JSON integer-array form.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> String {
        self.to_string()
    }
}

impl From<Vec<i32>> for RuntimeId {
    fn from(value: Vec<i32>) -> Self {
        Self(value)
    }
}

impl From<&[i32]> for RuntimeId {
    fn from(value: &[i32]) -> Self {
        Self(value.to_vec())
    }
}

impl Display for RuntimeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for (index, part) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{part}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn json_form_matches_serde() {
        let id = RuntimeId::new(vec![42, -7, 1]);
        assert_eq!(id.to_json(), "[42,-7,1]");
        assert_eq!(serde_json::to_string(&id).unwrap(), id.to_json());
        assert_eq!(RuntimeId::from_json(&id.to_json()).unwrap(), id);
    }

    #[rstest]
    #[case("")]
    #[case("[1,\"a\"]")]
    #[case("{\"id\":1}")]
    fn malformed_json_is_rejected(#[case] text: &str) {
        assert!(RuntimeId::from_json(text).is_err());
    }
}
