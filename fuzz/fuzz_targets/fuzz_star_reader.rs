#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use emstar::optics::OpticsTable;
use emstar::star::StarReader;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must produce blocks or errors, never a panic
    let Ok(names) = StarReader::new(Cursor::new(data)).block_names() else {
        return;
    };

    for name in names.iter().take(8) {
        if let Ok(table) = StarReader::new(Cursor::new(data)).read_table(name) {
            let _ = OpticsTable::from_table(&table);
            for row in table.iter().take(100) {
                let _ = row.get_f64("rlnAnglePsi");
                let _ = row.get_i64("rlnOpticsGroup");
            }
        }

        // Streaming path over the same block
        if let Ok(block) = StarReader::new(Cursor::new(data)).read_block(name) {
            for row in block.take(100) {
                if row.is_err() {
                    break;
                }
            }
        }
    }
});
