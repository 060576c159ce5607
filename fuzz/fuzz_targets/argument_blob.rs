#![no_main]

use libfuzzer_sys::fuzz_target;
use clrshim::args::{AdapterArguments, BootstrapArguments, MonikerTable};

fuzz_target!(|data: &[u8]| {
    let Ok(blob) = std::str::from_utf8(data) else {
        return;
    };

    let monikers = MonikerTable::default();
    if let Ok(args) = AdapterArguments::decode(blob) {
        let _ = monikers.classify(&args.framework);
    }
    if let Ok(args) = BootstrapArguments::decode(blob) {
        let _ = monikers.strict(true).classify(&args.framework);
    }
});
