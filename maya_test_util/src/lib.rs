//! Fixtures shared by the tests of the Maya Ledger harness crates.

#![warn(missing_docs)]

/// Derivation path used by the tests. First 3 items are hardened by the app.
pub const TEST_PATH: [u32; 5] = [44, 931, 0, 0, 0];

/// Human readable part of MAYAChain addresses
pub const MAYA_HRP: &str = "maya";

/// Address of [`TEST_PATH`] with the emulator test seed
pub const MAYA_ADDRESS: &str = "maya1mwyrp6lj85swy5e5g4hjlaacm33g6rw3pz7hk9";

/// A `MsgSend` sign doc, canonical form
pub const TX_MSG_SEND: &str = r#"{"account_number":"588","chain_id":"mayachain","fee":{"amount":[],"gas":"2000000"},"memo":"TestMemo","msgs":[{"type":"mayachain/MsgSend","value":{"amount":[{"amount":"150000000","denom":"cacao"}],"from_address":"tmaya1c648xgpter9xffhmcqvs7lzd7hxh0prgv5t5gp","to_address":"tmaya10xgrknu44d83qr4s4uw56cqxg0hsev5e68lc9z"}}],"sequence":"5"}"#;

/// A `MsgDeposit` sign doc, canonical form
pub const TX_MSG_DEPOSIT: &str = r#"{"account_number":"588","chain_id":"mayachain","fee":{"amount":[],"gas":"2000000"},"memo":"","msgs":[{"type":"mayachain/MsgDeposit","value":{"coins":[{"amount":"150000000","asset":"MAYA.CACAO"}],"memo":"=:BTC.BTC:bc1qp0g4v4nfuc2ydw6e9m9dvqrnrlqvxnj6ruwvvk","signer":"tmaya1c648xgpter9xffhmcqvs7lzd7hxh0prgv5t5gp"}}],"sequence":"5"}"#;

/// Initialize `env_logger` once, later calls from other tests are ignored
pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// Log and return true if `condition` does not hold, used to skip tests lacking a prerequisite
pub fn skip_unless(condition: bool, reason: &str) -> bool {
    if !condition {
        log::warn!("skipping: {reason}");
    }
    !condition
}
