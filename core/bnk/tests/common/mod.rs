#![allow(dead_code)]

use bnk::action::{Action, ActionParam, ActionSpecificParam};
use bnk::hirc::{ActorMixer, BankSourceData, Children, Event, FxBase, Sound};
use bnk::plugin::PluginParam;
use bnk::{Bank, BankHeader, Chunk, DataChunk, Hirc, HircObj, MediaIndex, MediaIndexEntry};

pub const BANK_ID: u32 = 0x5EED_0001;

pub fn frame(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = tag.to_vec();
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(body);
    out
}

pub fn bkhd(version: u32) -> Vec<u8> {
    let mut body = version.to_le_bytes().to_vec();
    body.extend_from_slice(&BANK_ID.to_le_bytes());
    body.extend_from_slice(&[0; 12]);
    frame(b"BKHD", &body)
}

/// `u32 count` then `u8 type, u32 size, body` per object.
pub fn hirc(objects: &[(u8, u32, Vec<u8>)]) -> Vec<u8> {
    let mut body = (objects.len() as u32).to_le_bytes().to_vec();
    for (type_code, declared, object) in objects {
        body.push(*type_code);
        body.extend_from_slice(&declared.to_le_bytes());
        body.extend_from_slice(object);
    }
    frame(b"HIRC", &body)
}

pub fn event_body(id: u32, actions: &[u32]) -> Vec<u8> {
    let mut body = id.to_le_bytes().to_vec();
    body.push(actions.len() as u8);
    for action in actions {
        body.extend_from_slice(&action.to_le_bytes());
    }
    body
}

pub fn play_action(id: u32, target_id: u32, version: u32) -> Action {
    Action {
        id,
        action_type: 0x0403,
        target_id,
        target_is_bus: 0,
        props: Default::default(),
        ranged_props: Default::default(),
        param: ActionParam::Play {
            fade_curve: 4,
            bank_id: BANK_ID,
            bank_type: (version >= 144).then_some(0),
        },
        specific: ActionSpecificParam::None,
    }
}

pub fn embedded_sound(id: u32, source_id: u32, size: u32, parent: u32) -> Sound {
    let mut sound = Sound {
        id,
        source: BankSourceData {
            plugin_id: 0x0004_0001,
            stream_type: 0,
            source_id,
            in_memory_media_size: size,
            ..Default::default()
        },
        ..Default::default()
    };
    sound.base.direct_parent_id = parent;
    sound
}

pub fn media(source_id: u32, len: usize) -> Vec<u8> {
    (0..len).map(|i| (source_id as usize + i) as u8).collect()
}

/// A small but complete bank: a mixer with two sounds, an event playing
/// them, an effect with an unrecognized plugin and two embedded media.
pub fn sample_bank(version: u32) -> Bank {
    let sources = [(1001u32, 48usize), (1002, 80)];

    let mut index = MediaIndex::default();
    let mut data = Vec::new();
    for (source_id, len) in sources {
        index
            .push(MediaIndexEntry {
                source_id,
                offset: data.len() as u32,
                size: len as u32,
            })
            .unwrap();
        data.extend(media(source_id, len));
    }

    let mut hierarchy = Hirc::new();
    hierarchy
        .push(HircObj::FxShareSet(FxBase {
            id: 300,
            plugin_id: 0x00AA_0003,
            params: PluginParam::Placeholder(vec![1, 2, 3, 4, 5]),
            ..Default::default()
        }))
        .unwrap();
    hierarchy
        .push(HircObj::ActorMixer(ActorMixer {
            id: 100,
            children: Children(vec![201, 202]),
            ..Default::default()
        }))
        .unwrap();
    for (n, (source_id, len)) in sources.into_iter().enumerate() {
        hierarchy
            .push(HircObj::Sound(embedded_sound(
                201 + n as u32,
                source_id,
                len as u32,
                100,
            )))
            .unwrap();
    }
    hierarchy
        .push(HircObj::Action(play_action(401, 201, version)))
        .unwrap();
    hierarchy
        .push(HircObj::Action(play_action(402, 202, version)))
        .unwrap();
    hierarchy
        .push(HircObj::Event(Event {
            id: 500,
            actions: vec![401, 402],
        }))
        .unwrap();

    Bank::from_parts(
        BankHeader {
            version,
            bank_id: BANK_ID,
            ..Default::default()
        },
        vec![
            Chunk::Didx(index),
            Chunk::Data(DataChunk::from_bytes(data)),
            Chunk::Hirc(hierarchy),
        ],
    )
    .unwrap()
}
