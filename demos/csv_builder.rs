use recfile::{Format, MemFs, Record, Timestamp, Writer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Contact {
    id: String,
    created_at: Option<Timestamp>,
    name: String,
    email: String,
}

impl Record for Contact {
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

fn contact(name: &str, email: &str) -> Contact {
    Contact {
        id: String::new(),
        created_at: None,
        name: name.into(),
        email: email.into(),
    }
}

fn main() -> Result<(), recfile::Error> {
    let fs = Arc::new(MemFs::new());
    fs.insert("contacts.csv", "id;created_at;name;email\n");

    // semicolon-separated, keyed by the email's local part
    let contacts = Writer::<Contact>::builder("contacts.csv")
        .format(Format::Csv)
        .delimiter(b';')
        .file_access(fs.clone())
        .id_generator(|_, c| c.email.split('@').next().unwrap_or_default().to_string())
        .writer()?;

    contacts.create(contact("Ada Lovelace", "ada@example.com"))?;
    contacts.create(contact("Alan Turing", "alan@example.com"))?;

    if let Err(e) = contacts.create(contact("Ada Again", "ada@example.org")) {
        println!("rejected: {e}");
    }

    println!("ada = {:?}", contacts.read_one(&"ada".to_string())?);
    let on_disk = fs.contents("contacts.csv").unwrap_or_default();
    println!("On-disk CSV:\n{}", String::from_utf8_lossy(&on_disk));
    println!("\nDebug output: {contacts:?}");
    Ok(())
}
