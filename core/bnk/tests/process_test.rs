mod common;

use bnk::process::{
    BANK_JSON, MEDIA_DIR, VerifyOutcome, bank_info, pack_bank, replace_media, unpack_bank, verify,
};
use bnk::{Bank, DecodeOptions};
use common::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_unpack_then_pack_is_identical() {
    let dir = tempdir().unwrap();
    let original = sample_bank(141).encode().unwrap();
    let input = dir.path().join("Sample.bnk");
    fs::write(&input, &original).unwrap();

    let unpacked = dir.path().join("Sample");
    unpack_bank(&input, &Some(unpacked.clone()), false, &DecodeOptions::default()).unwrap();
    assert!(unpacked.join(BANK_JSON).exists());
    assert_eq!(
        fs::read(unpacked.join(MEDIA_DIR).join("1001.wem")).unwrap(),
        media(1001, 48)
    );

    let output = dir.path().join("out/Sample.bnk");
    pack_bank(
        &unpacked.join(BANK_JSON),
        &unpacked.join(MEDIA_DIR),
        &output,
    )
    .unwrap();
    assert_eq!(fs::read(&output).unwrap(), original);
}

#[test]
fn test_pack_with_resized_media_recomputes_offsets() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("Sample.bnk");
    fs::write(&input, sample_bank(141).encode().unwrap()).unwrap();
    let unpacked = dir.path().join("Sample");
    unpack_bank(&input, &Some(unpacked.clone()), false, &DecodeOptions::default()).unwrap();

    let bigger = media(1001, 64);
    fs::write(unpacked.join(MEDIA_DIR).join("1001.wem"), &bigger).unwrap();
    let output = dir.path().join("Repacked.bnk");
    pack_bank(
        &unpacked.join(BANK_JSON),
        &unpacked.join(MEDIA_DIR),
        &output,
    )
    .unwrap();

    let bank = Bank::decode(&fs::read(&output).unwrap()).unwrap();
    assert_eq!(bank.check_didx_data(), Ok(()));
    assert_eq!(bank.media(1001), Some(&bigger[..]));
    assert_eq!(bank.media_index().unwrap().get(1002).unwrap().offset, 64);
}

#[test]
fn test_replace_media_in_place() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("Sample.bnk");
    fs::write(&input, sample_bank(150).encode().unwrap()).unwrap();
    let replacement = dir.path().join("new.wem");
    fs::write(&replacement, [7u8; 10]).unwrap();

    replace_media(&input, 1002, &replacement, &None, &DecodeOptions::default()).unwrap();
    let bank = Bank::decode(&fs::read(&input).unwrap()).unwrap();
    assert_eq!(bank.media(1002), Some(&[7u8; 10][..]));
    assert_eq!(bank.media(1001), Some(&media(1001, 48)[..]));
    assert_eq!(bank.check_didx_data(), Ok(()));

    assert!(replace_media(&input, 9999, &replacement, &None, &DecodeOptions::default()).is_err());
}

#[test]
fn test_verify_directory() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("a/b");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("One.bnk"), sample_bank(141).encode().unwrap()).unwrap();
    fs::write(dir.path().join("Two.BNK"), sample_bank(113).encode().unwrap()).unwrap();
    fs::write(dir.path().join("Broken.bnk"), b"RIFF0000").unwrap();
    fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let report = verify(dir.path(), &DecodeOptions::default()).unwrap();
    assert_eq!(report.files.len(), 3);
    assert_eq!(report.identical(), 2);
    assert_eq!(report.failed(), 1);
    assert!(!report.is_clean());
    let broken = report
        .files
        .iter()
        .find(|(path, _)| path.ends_with("Broken.bnk"))
        .unwrap();
    assert!(matches!(&broken.1, VerifyOutcome::Failed(msg) if msg.contains("Not a sound bank")));
}

#[test]
fn test_info_summary() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("Sample.bnk");
    fs::write(&input, sample_bank(141).encode().unwrap()).unwrap();

    let info = bank_info(&input, &DecodeOptions::default()).unwrap();
    assert_eq!(info.version, 141);
    assert_eq!(info.bank_id, BANK_ID);
    assert_eq!(info.media, 2);
    let tags: Vec<&str> = info.chunks.iter().map(|c| c.tag.as_str()).collect();
    assert_eq!(tags, vec!["BKHD", "DIDX", "DATA", "HIRC"]);
    assert_eq!(info.chunks[2].size, 128);
    assert_eq!(info.objects.get("Sound"), Some(&2));
    assert_eq!(info.objects.get("Action"), Some(&2));
}
