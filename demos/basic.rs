use recfile::{Record, Timestamp, Writer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Task {
    id: u64,
    created_at: Option<Timestamp>,
    #[serde(default)]
    updated_at: Option<Timestamp>,
    title: String,
    done: bool,
}

impl Record for Task {
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

fn task(title: &str) -> Task {
    Task {
        id: 0,
        created_at: None,
        updated_at: None,
        title: title.into(),
        done: false,
    }
}

fn main() -> Result<(), recfile::Error> {
    let path = std::env::temp_dir().join("recfile_example_basic.json");
    std::fs::write(&path, "[]")?;
    let tasks = Writer::<Task>::open(&path)?;

    // create assigns ids 1, 2, 3
    let milk = tasks.create(task("buy milk"))?;
    tasks.create(task("write docs"))?;
    tasks.create(task("ship it"))?;
    println!("created {:?}", milk);

    // update in place
    let mut done = milk.clone();
    done.done = true;
    tasks.update(&milk.id, done)?;
    println!("after update: {:?}", tasks.read_one(&milk.id)?);

    // upsert: no id means insert
    let extra = tasks.upsert(task("one more"))?;
    println!("upserted as id {}", extra.id);

    // queries
    println!("open tasks = {:?}", tasks.find(|t| !t.done).len());
    println!("len        = {}", tasks.len());

    // delete
    tasks.delete(&2)?;
    match tasks.delete(&2) {
        Err(e) if e.is_not_found() => println!("second delete: {e}"),
        other => println!("unexpected: {other:?}"),
    }

    println!("on disk: {}", std::fs::read_to_string(tasks.path())?);
    let _ = std::fs::remove_file(&path);
    Ok(())
}
