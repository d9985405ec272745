//! Basic usage example for the carrier container format.

use bytes::Bytes;
use carrier_wire::{
    parse_chunks, splice_before_terminator, Chunk, ChunkType, ContainerBuilder, ImageHeader,
    TextEntry,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Carrier Container Example ===\n");

    // 1. Build a minimal container
    println!("1. Building a 1x1 container...");
    let scanline = Bytes::from_static(&[
        0x78, 0x9c, 0x63, 0x60, 0x00, 0x02, 0x00, 0x00, 0x05, 0x00, 0x01,
    ]);
    let base = ContainerBuilder::new(ImageHeader::rgba8(1, 1))
        .chunk(Chunk::new(ChunkType::IDAT, scanline))
        .build()?;
    println!("   Container size: {} bytes", base.len());

    // 2. Splice text entries before IEND
    println!("\n2. Splicing two iTXt entries...");
    let entries = vec![
        TextEntry::new("note-0001", Bytes::from_static(b"hello"))?.into_chunk()?,
        TextEntry::new("note-0002", Bytes::from_static(b"world"))?.into_chunk()?,
    ];
    let spliced = splice_before_terminator(&base, &entries)?;
    println!("   Spliced size: {} bytes", spliced.len());

    // 3. Walk the chunks
    println!("\n3. Scanning chunks...");
    for chunk in parse_chunks(&spliced)?.verify_crc(true) {
        let chunk = chunk?;
        print!(
            "   {} at offset {} ({} bytes)",
            chunk.chunk_type,
            chunk.offset,
            chunk.data.len()
        );
        if chunk.chunk_type == ChunkType::ITXT {
            let entry = TextEntry::parse(chunk.data)?;
            print!(" keyword={} text={:?}", entry.keyword, std::str::from_utf8(&entry.text));
        }
        println!();
    }

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
