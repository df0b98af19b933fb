#![allow(dead_code)]

use recfile::{MemFs, Record, Timestamp};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub const FOOBAR_JSON: &str = r#"[
    {
        "id": 1,
        "created_at": "2022-12-27T12:45:51.8347046-08:00",
        "name": "Foobar"
    }
]"#;

pub const FOOBAR_CSV: &str = "\"id\",\"created_at\",\"name\"
\t\t1,\"2022-12-27T12:45:51.8347046-08:00\",\"Foobar\"";

pub fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("recfile_test_{}", name))
}

/// In-memory fs holding `data.json`, `data.csv` and an empty `invalid.json`.
pub fn fixture_fs() -> Arc<MemFs> {
    let fs = MemFs::new();
    fs.insert("data.json", FOOBAR_JSON);
    fs.insert("data.csv", FOOBAR_CSV);
    fs.insert("invalid.json", "");
    Arc::new(fs)
}

// ---- sequential ids ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: u64,
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    pub name: String,
}

impl Record for Person {
    type Id = u64;

    fn id(&self) -> &u64 {
        &self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    fn set_created_at(&mut self, at: Timestamp) {
        self.created_at = Some(at);
    }

    fn updated_at(&self) -> Option<Timestamp> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: Timestamp) {
        self.updated_at = Some(at);
    }
}

pub fn person(name: &str) -> Person {
    Person {
        id: 0,
        created_at: None,
        updated_at: None,
        name: name.into(),
    }
}

// ---- uuid ids -----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    pub title: String,
}

impl Record for Ticket {
    type Id = Uuid;

    fn id(&self) -> &Uuid {
        &self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    fn set_created_at(&mut self, at: Timestamp) {
        self.created_at = Some(at);
    }

    fn updated_at(&self) -> Option<Timestamp> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: Timestamp) {
        self.updated_at = Some(at);
    }
}

pub fn ticket(title: &str) -> Ticket {
    Ticket {
        id: Uuid::nil(),
        created_at: None,
        updated_at: None,
        title: title.into(),
    }
}

// ---- caller-keyed -------------------------------------------------------------

/// No update timestamp: exercises the optional capability's no-op default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub id: String,
    pub created_at: Option<Timestamp>,
    pub value: String,
}

impl Record for Setting {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    fn set_created_at(&mut self, at: Timestamp) {
        self.created_at = Some(at);
    }
}

pub fn setting(id: &str, value: &str) -> Setting {
    Setting {
        id: id.into(),
        created_at: None,
        value: value.into(),
    }
}
