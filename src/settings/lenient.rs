//! Decoding a settings document where scalars may be strings
//!
//! Flag and environment values enter the document as strings. [`Lenient`]
//! parses a string into the number or boolean the target field asks for, and
//! renders a number or boolean when the target wants a string. A string
//! target for a sequence field is split on `,`, the way list flags are
//! joined.

use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Unexpected, Visitor};
use serde_yaml::{Error, Value};

pub(crate) struct Lenient(pub(crate) Value);

/// Parse string scalars for the numeric and boolean hints.
macro_rules! parse_str {
    ($($method:ident => $visit:ident($ty:ty),)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
            match self.0 {
                Value::String(s) => match s.trim().parse::<$ty>() {
                    Ok(parsed) => visitor.$visit(parsed),
                    Err(_) => Err(de::Error::invalid_type(Unexpected::Str(&s), &visitor)),
                },
                other => other.$method(visitor),
            }
        }
    )*};
}

macro_rules! delegate {
    ($($method:ident($($arg:ident: $ty:ty),*),)*) => {$(
        fn $method<V: Visitor<'de>>(self, $($arg: $ty,)* visitor: V) -> Result<V::Value, Error> {
            self.0.$method($($arg,)* visitor)
        }
    )*};
}

impl<'de> Deserializer<'de> for Lenient {
    type Error = Error;

    parse_str! {
        deserialize_bool => visit_bool(bool),
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
    }

    delegate! {
        deserialize_any(),
        deserialize_char(),
        deserialize_bytes(),
        deserialize_byte_buf(),
        deserialize_unit(),
        deserialize_unit_struct(name: &'static str),
        deserialize_tuple(len: usize),
        deserialize_tuple_struct(name: &'static str, len: usize),
        deserialize_enum(name: &'static str, variants: &'static [&'static str]),
        deserialize_identifier(),
        deserialize_ignored_any(),
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.0 {
            Value::Number(n) => visitor.visit_string(n.to_string()),
            Value::Bool(b) => visitor.visit_string(b.to_string()),
            other => other.deserialize_str(visitor),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.0 {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(Lenient(other)),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.0 {
            Value::Sequence(items) => visitor.visit_seq(Elements(items.into_iter())),
            Value::String(s) => {
                let items: Vec<Value> = if s.is_empty() {
                    Vec::new()
                } else {
                    s.split(',').map(|part| Value::String(part.trim().to_string())).collect()
                };
                visitor.visit_seq(Elements(items.into_iter()))
            }
            other => other.deserialize_seq(visitor),
        }
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.0 {
            Value::Mapping(map) => visitor.visit_map(Entries { iter: map.into_iter(), value: None }),
            other => other.deserialize_map(visitor),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.deserialize_map(visitor)
    }
}

struct Elements(std::vec::IntoIter<Value>);

impl<'de> SeqAccess<'de> for Elements {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>, Error> {
        self.0.next().map(|item| seed.deserialize(Lenient(item))).transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.0.len())
    }
}

struct Entries {
    iter: serde_yaml::mapping::IntoIter,
    value: Option<Value>,
}

impl<'de> MapAccess<'de> for Entries {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, Error> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(key).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Error> {
        match self.value.take() {
            Some(value) => seed.deserialize(Lenient(value)),
            None => Err(de::Error::custom("map value requested before its key")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Target {
        name: String,
        port: u16,
        ratio: f64,
        debug: bool,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        limit: Option<u32>,
    }

    fn decode<T: for<'de> Deserialize<'de>>(yaml: &str) -> Result<T, Error> {
        let value: Value = serde_yaml::from_str(yaml).expect("yaml");
        T::deserialize(Lenient(value))
    }

    #[test]
    fn test_strings_parse_into_typed_fields() {
        let target: Target =
            decode("name: api\nport: '8080'\nratio: '0.5'\ndebug: 'true'\ntags: a, b\nlimit: '3'\n")
                .expect("decode");
        assert_eq!(
            target,
            Target {
                name: "api".into(),
                port: 8080,
                ratio: 0.5,
                debug: true,
                tags: vec!["a".into(), "b".into()],
                limit: Some(3),
            }
        );
    }

    #[test]
    fn test_numbers_and_bools_render_into_string_fields() {
        let target: Target =
            decode("name: 42\nport: 1\nratio: 1.5\ndebug: false\ntags: [1, true]\n").expect("decode");
        assert_eq!(target.name, "42");
        assert_eq!(target.tags, vec!["1".to_string(), "true".to_string()]);
        assert_eq!(target.limit, None);
    }

    #[test]
    fn test_unparsable_string_is_a_type_error() {
        let err = decode::<Target>("name: x\nport: not-a-port\nratio: 1\ndebug: true\n")
            .expect_err("mismatch");
        assert!(err.to_string().contains("not-a-port"));
    }
}
