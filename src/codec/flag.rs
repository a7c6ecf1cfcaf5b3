use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The gateway's boolean: `0`/`1` on the wire, though some firmware sends JSON booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flag(bool);

impl Flag {
    pub fn is_set(self) -> bool {
        self.0
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        Flag(value)
    }
}

impl From<Flag> for bool {
    fn from(flag: Flag) -> Self {
        flag.0
    }
}

impl Serialize for Flag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(u8::from(self.0))
    }
}

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(FlagVisitor)
    }
}

struct FlagVisitor;

impl<'de> Visitor<'de> for FlagVisitor {
    type Value = Flag;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("0, 1 or a boolean")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Flag, E> {
        Ok(Flag(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Flag, E> {
        Ok(Flag(value != 0))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Flag, E> {
        Ok(Flag(value != 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(1), true)]
    #[case(json!(0), false)]
    #[case(json!(2), true)]
    #[case(json!(true), true)]
    #[case(json!(false), false)]
    fn deserializes_integers_and_booleans(#[case] raw: serde_json::Value, #[case] expected: bool) -> Result<(), serde_json::Error> {
        let flag: Flag = serde_json::from_value(raw)?;

        assert_eq!(flag.is_set(), expected);
        Ok(())
    }

    #[test]
    fn serializes_as_an_integer() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_value(Flag::from(true))?, json!(1));
        assert_eq!(serde_json::to_value(Flag::from(false))?, json!(0));
        Ok(())
    }

    #[test]
    fn rejects_strings() {
        let result = serde_json::from_value::<Flag>(json!("on"));

        assert!(result.is_err());
    }
}
