mod common;

use chrono::{TimeZone, Utc};
use common::{person, Person};
use proptest::prelude::*;
use recfile::{Codec, CsvCodec, JsonCodec, MemFs, Writer};
use std::sync::Arc;

fn people(names: Vec<String>, stamped: Vec<bool>) -> Vec<Person> {
    names
        .into_iter()
        .zip(stamped)
        .enumerate()
        .map(|(i, (name, stamp))| Person {
            id: i as u64 + 1,
            created_at: Utc.timestamp_opt(1_672_173_951 + i as i64, 123_456_789).single(),
            updated_at: if stamp {
                Utc.timestamp_opt(1_700_000_000 + i as i64, 0).single()
            } else {
                None
            },
            name,
        })
        .collect()
}

#[derive(Debug, Clone)]
enum Op {
    Create(String),
    Update(usize, String),
    Delete(usize),
    Upsert(usize, String),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[a-z]{1,6}".prop_map(Op::Create),
        (0usize..12, "[a-z]{1,6}").prop_map(|(i, n)| Op::Update(i, n)),
        (0usize..12).prop_map(Op::Delete),
        (0usize..12, "[a-z]{1,6}").prop_map(|(i, n)| Op::Upsert(i, n)),
    ]
}

/// Pick an existing id by position, or one that is never used.
fn pick(model: &[(u64, String)], i: usize) -> u64 {
    if i < model.len() {
        model[i].0
    } else {
        10_000 + i as u64
    }
}

proptest! {
    #[test]
    fn json_decode_inverts_encode(
        (names, stamped) in (0usize..16).prop_flat_map(|n| (
            proptest::collection::vec("[a-zA-Z0-9 ,\"\\\\]{0,12}", n),
            proptest::collection::vec(any::<bool>(), n),
        ))
    ) {
        let records = people(names, stamped);
        let codec = JsonCodec::new();
        let bytes = Codec::<Person>::encode(&codec, &records).unwrap();
        let back: Vec<Person> = codec.decode(&bytes).unwrap();
        prop_assert_eq!(back, records);
    }

    // Starts at one row: a fresh codec has no header for an empty collection.
    #[test]
    fn csv_decode_inverts_encode(
        (names, stamped) in (1usize..16).prop_flat_map(|n| (
            proptest::collection::vec("[a-zA-Z0-9 \t\n,;\"]{0,12}", n),
            proptest::collection::vec(any::<bool>(), n),
        )),
        delimiter in prop_oneof![Just(b','), Just(b';'), Just(b'\t'), Just(b'|')],
    ) {
        let records = people(names, stamped);
        let codec = CsvCodec::with_delimiter(delimiter);
        let bytes = Codec::<Person>::encode(&codec, &records).unwrap();
        let back: Vec<Person> = codec.decode(&bytes).unwrap();
        prop_assert_eq!(back, records);
    }

    #[test]
    fn operations_match_a_simple_model(ops in proptest::collection::vec(op(), 0..40)) {
        let fs = Arc::new(MemFs::new());
        fs.insert("model.json", "[]");
        let db = Writer::<Person>::open_with(fs.clone(), "model.json").unwrap();
        let mut model: Vec<(u64, String)> = Vec::new();

        for op in ops {
            match op {
                Op::Create(name) => {
                    let next = model.iter().map(|(id, _)| *id).max().unwrap_or(0) + 1;
                    let stored = db.create(person(&name)).unwrap();
                    prop_assert_eq!(stored.id, next);
                    model.push((next, name));
                }
                Op::Update(i, name) => {
                    let id = pick(&model, i);
                    match model.iter_mut().find(|(mid, _)| *mid == id) {
                        Some(entry) => {
                            db.update(&id, person(&name)).unwrap();
                            entry.1 = name;
                        }
                        None => {
                            prop_assert!(db.update(&id, person(&name)).unwrap_err().is_not_found());
                        }
                    }
                }
                Op::Delete(i) => {
                    let id = pick(&model, i);
                    match model.iter().position(|(mid, _)| *mid == id) {
                        Some(pos) => {
                            db.delete(&id).unwrap();
                            model.remove(pos);
                        }
                        None => {
                            prop_assert!(db.delete(&id).unwrap_err().is_not_found());
                        }
                    }
                }
                Op::Upsert(i, name) => {
                    let id = pick(&model, i);
                    let mut record = person(&name);
                    record.id = id;
                    match model.iter_mut().find(|(mid, _)| *mid == id) {
                        Some(entry) => entry.1 = name,
                        None => model.push((id, name)),
                    }
                    prop_assert_eq!(db.upsert(record).unwrap().id, id);
                }
            }
        }

        let seen: Vec<(u64, String)> = db.read_all().into_iter().map(|p| (p.id, p.name)).collect();
        prop_assert_eq!(&seen, &model);

        let reopened = Writer::<Person>::open_with(fs, "model.json").unwrap();
        let reloaded: Vec<(u64, String)> =
            reopened.read_all().into_iter().map(|p| (p.id, p.name)).collect();
        prop_assert_eq!(reloaded, model);
    }
}
