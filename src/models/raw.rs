use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Placeholder text written for a field that could not be extracted
pub const UNSPECIFIED: &str = "Не указано";

/// Text fields extracted from one listing page.
///
/// `None` marks a field that could not be found. It only becomes the
/// [`UNSPECIFIED`] text when the record is serialized, and that text reads
/// back as `None`. The originating link is always written last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawListing {
    fields: Vec<(String, Option<String>)>,
    pub link: String,
}

impl RawListing {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            fields: Vec::new(),
            link: link.into(),
        }
    }

    /// Sets a field, replacing an earlier value of the same name
    pub fn set(&mut self, name: &str, value: Option<String>) {
        let value = value.filter(|v| v != UNSPECIFIED);
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn with(mut self, name: &str, value: Option<&str>) -> Self {
        self.set(name, value.map(str::to_string));
        self
    }

    /// Value of a field; `None` when absent or unspecified
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }
}

impl Serialize for RawListing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value.as_deref().unwrap_or(UNSPECIFIED))?;
        }
        map.serialize_entry("link", &self.link)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for RawListing {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawListingVisitor;

        impl<'de> Visitor<'de> for RawListingVisitor {
            type Value = RawListing;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of text fields with a `link`")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawListing, A::Error> {
                let mut listing = RawListing::default();
                let mut link = None;

                while let Some((name, value)) = access.next_entry::<String, Option<String>>()? {
                    if name == "link" {
                        link = value;
                    } else {
                        listing.set(&name, value);
                    }
                }

                listing.link = link.ok_or_else(|| de::Error::missing_field("link"))?;
                Ok(listing)
            }
        }

        deserializer.deserialize_map(RawListingVisitor)
    }
}
