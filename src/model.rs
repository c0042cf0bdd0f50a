use serde::de::{self, Deserializer, Visitor};
use serde_derive::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub type User = String; // bgg user name

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub bgg_username: User,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Game {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub wanted_by: Vec<User>,
    #[serde(default)]
    pub owned_by: Vec<User>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MostWantedEntry {
    #[serde(deserialize_with = "string_or_number")]
    pub game_id: String,
}

#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Analysis {
    pub master_list: BTreeMap<String, Game>,
    #[serde(default)]
    pub most_wanted: Vec<MostWantedEntry>,
}

impl Analysis {
    /// Dereferences a most wanted entry into the master list.
    pub fn game(&self, entry: &MostWantedEntry) -> Option<&Game> {
        self.master_list.get(&entry.game_id)
    }
}

pub type MemberIndex = HashMap<User, Member>;

// Game ids come out of the analysis job as numbers or strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or an integer id")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_owned())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}
