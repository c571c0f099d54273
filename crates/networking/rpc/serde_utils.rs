use serde::{Deserialize, Deserializer, Serializer, de::Error};

fn parse_quantity<E: Error>(value: &str) -> Result<u64, E> {
    u64::from_str_radix(value.trim_start_matches("0x"), 16)
        .map_err(|_| E::custom(format!("Failed to deserialize quantity {value}")))
}

/// Hex encoded `u64` quantities (`"0x5208"`).
pub mod quantity {
    use super::*;

    pub fn deserialize<'de, D>(d: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(d)?;
        parse_quantity(&value)
    }

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{value:#x}"))
    }

    pub mod opt {
        use super::*;

        pub fn deserialize<'de, D>(d: D) -> Result<Option<u64>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(d)?
                .map(|value| parse_quantity(&value))
                .transpose()
        }

        pub fn serialize<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(value) => serializer.serialize_str(&format!("{value:#x}")),
                None => serializer.serialize_none(),
            }
        }
    }
}

/// Receipt status: `0x1` for success, `0x0` for failure.
pub mod status {
    use super::*;

    pub fn deserialize<'de, D>(d: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(d)?;
        match parse_quantity::<D::Error>(&value)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(D::Error::custom(format!("Invalid status value {other}"))),
        }
    }

    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(if *value { "0x1" } else { "0x0" })
    }
}

pub mod hex_bytes {
    use super::*;
    use bytes::Bytes;

    pub fn deserialize<'de, D>(d: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(d)?;
        let decoded = hex::decode(value.trim_start_matches("0x"))
            .map_err(|e| D::Error::custom(e.to_string()))?;
        Ok(Bytes::from(decoded))
    }

    pub fn serialize<S>(value: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(value)))
    }
}
