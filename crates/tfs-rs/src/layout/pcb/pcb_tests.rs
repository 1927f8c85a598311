use crate::error::FsError;
use crate::layout::fat::{END_OF_CHAIN, FREE, OUT_OF_RANGE};
use crate::layout::pcb::{HEADER_SIZE, Pcb};

const BLOCK: usize = 128;
const BLOCKS: i32 = 511;

fn linked_pcb() -> Pcb {
    let mut pcb = Pcb::new(BLOCK, BLOCKS);
    pcb.link_reserved_chain().expect("link");
    pcb
}

#[test]
fn new_reserves_the_metadata_span() {
    let pcb = Pcb::new(BLOCK, BLOCKS);
    let span = (HEADER_SIZE + 4 * BLOCKS as usize).div_ceil(BLOCK) as i32;
    assert_eq!(pcb.root_dir_block(), span);
    assert_eq!(pcb.first_free_block(), span);
}

#[test]
fn reserved_chain_links_every_metadata_block() {
    let pcb = linked_pcb();
    let end = pcb.root_dir_block() - 1;
    for i in 0..end {
        assert_eq!(pcb.fat().get(i), i + 1);
    }
    assert_eq!(pcb.fat().get(end), END_OF_CHAIN);
}

#[test]
fn reserved_entries_are_frozen_once_set() {
    let mut pcb = linked_pcb();
    assert_eq!(pcb.set_fat(0, END_OF_CHAIN), Err(FsError::FatGuard));
    assert_eq!(pcb.set_fat(pcb.root_dir_block() - 1, 5), Err(FsError::FatGuard));
    pcb.set_fat(pcb.root_dir_block(), END_OF_CHAIN)
        .expect("blocks past the reserved span stay writable");
}

#[test]
fn set_fat_rejects_out_of_range_index_and_value() {
    let mut pcb = linked_pcb();
    assert_eq!(pcb.set_fat(-1, FREE), Err(FsError::FatGuard));
    assert_eq!(pcb.set_fat(BLOCKS, FREE), Err(FsError::FatGuard));
    assert_eq!(pcb.set_fat(100, BLOCKS), Err(FsError::FatGuard));
    assert_eq!(pcb.set_fat(100, -2), Err(FsError::FatGuard));
}

#[test]
fn allocate_skips_reserved_span_and_pivot() {
    let pcb = linked_pcb();
    let pivot = pcb.first_free_block();
    let got = pcb.allocate(4).expect("allocate");
    assert_eq!(got.len(), 4);
    for block in &got {
        assert!(*block > pcb.root_dir_block());
        assert_ne!(*block, pivot);
        assert_eq!(pcb.fat().get(*block), FREE);
    }
}

#[test]
fn allocate_skips_occupied_blocks() {
    let mut pcb = linked_pcb();
    let first = pcb.root_dir_block() + 1;
    pcb.set_fat(first, END_OF_CHAIN).expect("occupy");
    let got = pcb.allocate(1).expect("allocate");
    assert!(!got.contains(&first));
}

#[test]
fn allocate_reports_out_of_space() {
    let mut pcb = linked_pcb();
    for i in pcb.root_dir_block()..BLOCKS {
        pcb.set_fat(i, END_OF_CHAIN).expect("occupy");
    }
    assert_eq!(pcb.allocate(1), Err(FsError::OutOfSpace));
}

#[test]
fn one_free_skips_pivot_and_reports_exhaustion() {
    let mut pcb = linked_pcb();
    let pivot = pcb.first_free_block();
    let free = pcb.one_free();
    assert_ne!(free, pivot);
    assert_eq!(pcb.fat().get(free), FREE);

    for i in pcb.root_dir_block()..BLOCKS {
        pcb.set_fat(i, END_OF_CHAIN).expect("occupy");
    }
    assert_eq!(pcb.one_free(), -1);
}

#[test]
fn free_chain_clears_every_linked_block() {
    let mut pcb = linked_pcb();
    let root = pcb.root_dir_block();
    pcb.set_fat(root + 1, root + 4).expect("link");
    pcb.set_fat(root + 4, root + 2).expect("link");
    pcb.set_fat(root + 2, END_OF_CHAIN).expect("link");

    pcb.free_chain(root + 1).expect("free");
    assert_eq!(pcb.fat().get(root + 1), FREE);
    assert_eq!(pcb.fat().get(root + 4), FREE);
    assert_eq!(pcb.fat().get(root + 2), FREE);
}

#[test]
fn free_chain_rejects_reserved_heads() {
    let mut pcb = linked_pcb();
    assert_eq!(pcb.free_chain(0), Err(FsError::FatGuard));
    assert_eq!(
        pcb.free_chain(pcb.root_dir_block() - 1),
        Err(FsError::FatGuard)
    );
    assert_eq!(pcb.free_chain(BLOCKS), Err(FsError::FatGuard));
}

#[test]
fn bytes_roundtrip_preserves_header_and_table() {
    let mut pcb = linked_pcb();
    let root = pcb.root_dir_block();
    pcb.set_fat(root, END_OF_CHAIN).expect("root");
    pcb.set_fat(root + 3, root + 7).expect("chain");
    pcb.set_fat(root + 7, END_OF_CHAIN).expect("chain");
    pcb.set_first_free_block(root + 1).expect("pivot");

    let bytes = pcb.to_bytes();
    assert_eq!(bytes.len() % BLOCK, 0, "serialized form is block padded");

    let back = Pcb::from_bytes(&bytes, BLOCK, BLOCKS as usize).expect("parse");
    assert_eq!(back, pcb);
}

#[test]
fn bytes_roundtrip_covers_the_partial_tail_block() {
    // 16 + 4 * 100 = 416 bytes over 64-byte blocks: the last block is only
    // half used, and the highest table entries live inside it.
    let mut pcb = Pcb::new(64, 100);
    pcb.link_reserved_chain().expect("link");
    pcb.set_fat(99, END_OF_CHAIN).expect("tail entry");
    pcb.set_fat(98, 99).expect("tail entry");

    let back = Pcb::from_bytes(&pcb.to_bytes(), 64, 100).expect("parse");
    assert_eq!(back.fat().get(98), 99);
    assert_eq!(back.fat().get(99), END_OF_CHAIN);
}

#[test]
fn from_bytes_prefers_caller_geometry() {
    let pcb = linked_pcb();
    let mut bytes = pcb.to_bytes();
    bytes[0..4].copy_from_slice(&999i32.to_be_bytes());
    bytes[4..8].copy_from_slice(&7i32.to_be_bytes());

    let back = Pcb::from_bytes(&bytes, BLOCK, BLOCKS as usize).expect("parse");
    assert_eq!(back.block_size(), BLOCK);
    assert_eq!(back.num_blocks(), BLOCKS);
}

#[test]
fn from_bytes_rejects_short_buffer() {
    let pcb = linked_pcb();
    let bytes = pcb.to_bytes();
    assert_eq!(
        Pcb::from_bytes(&bytes[..bytes.len() - BLOCK], BLOCK, BLOCKS as usize),
        Err(FsError::IoError)
    );
}

#[test]
fn out_of_range_lookup_keeps_the_sentinel() {
    let pcb = linked_pcb();
    assert_eq!(pcb.fat().get(BLOCKS + 1), OUT_OF_RANGE);
}

#[test]
fn display_lists_geometry_and_table() {
    let pcb = linked_pcb();
    let text = pcb.to_string();
    assert!(text.contains("block size: 128"));
    assert!(text.contains("blocks: 511"));
    assert!(text.contains("root directory block"));
    assert!(text.contains("  0: 1"));
}
