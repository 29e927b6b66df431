mod common;

use bnk::{Bank, CancelToken, Chunk, DecodeOptions, HircCategory, HircObj, SUPPORTED_VERSIONS};
use common::*;

#[test]
fn test_encode_is_idempotent_for_every_version() {
    for &version in SUPPORTED_VERSIONS {
        let first = sample_bank(version).encode().unwrap();
        let decoded = Bank::decode(&first)
            .unwrap_or_else(|e| panic!("version {version}: {e}"));
        assert_eq!(decoded.version(), version);
        let second = decoded.encode().unwrap();
        assert_eq!(first, second, "version {version}");
    }
}

#[test]
fn test_sequential_and_parallel_decode_agree() {
    let bytes = sample_bank(150).encode().unwrap();
    let sequential = DecodeOptions {
        workers: 1,
        parallel_hirc: false,
        ..Default::default()
    };
    let a = Bank::decode_with(&bytes[..], &sequential, &CancelToken::new()).unwrap();
    let b = Bank::decode(&bytes).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_chunk_order_is_file_order() {
    let bytes = sample_bank(141).encode().unwrap();
    let bank = Bank::decode(&bytes).unwrap();
    let tags: Vec<[u8; 4]> = bank.chunks().iter().map(Chunk::tag).collect();
    assert_eq!(tags, vec![*b"DIDX", *b"DATA", *b"HIRC"]);

    let hierarchy = bank.hierarchy().unwrap();
    let ids: Vec<u32> = hierarchy.objects().iter().map(HircObj::id).collect();
    assert_eq!(ids, vec![300, 100, 201, 202, 401, 402, 500]);
    assert_eq!(hierarchy.category_ids(HircCategory::Action), vec![401, 402]);
}

#[test]
fn test_edits_survive_encode() {
    let bytes = sample_bank(145).encode().unwrap();
    let mut bank = Bank::decode(&bytes).unwrap();

    let hierarchy = bank.hierarchy_mut().unwrap();
    match hierarchy.get_mut(HircCategory::Event, 500) {
        Some(HircObj::Event(event)) => event.actions.reverse(),
        other => panic!("unexpected object {other:?}"),
    }
    let removed = hierarchy.remove(HircCategory::Action, 402).unwrap();
    assert!(removed.is_some());

    let bank = Bank::decode(&bank.encode().unwrap()).unwrap();
    let hierarchy = bank.hierarchy().unwrap();
    assert_eq!(hierarchy.len(), 6);
    match hierarchy.get(HircCategory::Event, 500) {
        Some(HircObj::Event(event)) => assert_eq!(event.actions, vec![402, 401]),
        other => panic!("unexpected object {other:?}"),
    }
    assert!(hierarchy.get(HircCategory::Action, 402).is_none());
}

#[test]
fn test_json_round_trip_with_media_restored() {
    let bytes = sample_bank(154).encode().unwrap();
    let bank = Bank::decode(&bytes).unwrap();

    let json = serde_json::to_string(&bank).unwrap();
    let mut restored: Bank = serde_json::from_str(&json).unwrap();
    restored.set_data(bank.data().unwrap().bytes().to_vec());

    assert_eq!(restored.check_didx_data(), Ok(()));
    assert_eq!(restored.encode().unwrap(), bytes);
}

#[test]
fn test_json_rejects_unsupported_version() {
    let bank = sample_bank(141);
    let json = serde_json::to_string(&bank)
        .unwrap()
        .replacen("\"version\":141", "\"version\":1", 1);
    assert!(serde_json::from_str::<Bank>(&json).is_err());
}
