use bitcoin::opcodes::all::{
    OP_CSV, OP_CHECKSIG, OP_DROP, OP_ELSE, OP_ENDIF, OP_EQUAL, OP_IF, OP_SHA256,
};
use bitcoin::opcodes::Opcode;
use bitcoin::secp256k1::PublicKey;
use bitcoin::ScriptBuf;

use crate::error::SwapError;

pub const MIN_CSV_HEIGHT: u32 = 2;
pub const MAX_CSV_HEIGHT: u32 = 0x7fff;

/// Longest payload a single `OP_PUSHBYTES_n` can carry.
const MAX_DIRECT_PUSH: usize = 0x4b;

/// Byte-level script assembly.
///
/// The CSV height uses the exact encoding the LSP derives its addresses
/// from, which `bitcoin::script::Builder::push_int` would not reproduce.
#[derive(Debug, Default, Clone)]
pub struct ScriptBuilder {
    bytes: Vec<u8>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_opcode(mut self, op: Opcode) -> Self {
        self.bytes.push(op.to_u8());
        self
    }

    /// Length-prefixed direct push of up to 75 bytes.
    pub fn push_slice(mut self, data: &[u8]) -> Result<Self, SwapError> {
        if data.len() > MAX_DIRECT_PUSH {
            return Err(SwapError::PushTooLarge(data.len()));
        }
        self.bytes.push(data.len() as u8);
        self.bytes.extend_from_slice(data);
        Ok(self)
    }

    /// Push a relative timelock height.
    ///
    /// | height        | bytes                |
    /// |---------------|----------------------|
    /// | 2..=16        | `0x50 + h`           |
    /// | 17..=0x4b     | `h`                  |
    /// | 0x4c..=0x7f   | `0x01 h`             |
    /// | 0x80..=0x7fff | `0x02 lo hi`         |
    pub fn push_csv_height(mut self, height: u32) -> Result<Self, SwapError> {
        match height {
            h if h < MIN_CSV_HEIGHT || h > MAX_CSV_HEIGHT => {
                return Err(SwapError::InvalidCsvHeight(h))
            }
            h if h <= 16 => self.bytes.push(0x50 + h as u8),
            h if h <= 0x4b => self.bytes.push(h as u8),
            h if h <= 0x7f => self.bytes.extend_from_slice(&[0x01, h as u8]),
            h => self
                .bytes
                .extend_from_slice(&[0x02, (h & 0xff) as u8, (h >> 8) as u8]),
        }
        Ok(self)
    }

    pub fn into_script(self) -> ScriptBuf {
        ScriptBuf::from_bytes(self.bytes)
    }
}

/// Swap redeem script:
///
/// ```text
/// OP_SHA256 <payment_hash> OP_EQUAL
/// OP_IF
///     <htlc_pubkey>
/// OP_ELSE
///     <csv_height> OP_CSV OP_DROP <refund_pubkey>
/// OP_ENDIF
/// OP_CHECKSIG
/// ```
pub fn submarine_script(
    payment_hash: &[u8; 32],
    htlc_pubkey: &PublicKey,
    refund_pubkey: &PublicKey,
    csv_height: u32,
) -> Result<ScriptBuf, SwapError> {
    Ok(ScriptBuilder::new()
        .push_opcode(OP_SHA256)
        .push_slice(payment_hash)?
        .push_opcode(OP_EQUAL)
        .push_opcode(OP_IF)
        .push_slice(&htlc_pubkey.serialize())?
        .push_opcode(OP_ELSE)
        .push_csv_height(csv_height)?
        .push_opcode(OP_CSV)
        .push_opcode(OP_DROP)
        .push_slice(&refund_pubkey.serialize())?
        .push_opcode(OP_ENDIF)
        .push_opcode(OP_CHECKSIG)
        .into_script())
}
