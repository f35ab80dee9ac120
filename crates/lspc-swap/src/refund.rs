use std::str::FromStr;

use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{Message, Secp256k1, SecretKey};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, Script, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};

use crate::error::SwapError;
use crate::types::RepayData;

/// Witness bytes per input: signature push (1 + 73), empty push (1), script
/// push (1 + script length).
fn witness_size(script: &[u8]) -> u64 {
    1 + 73 + 1 + 1 + script.len() as u64
}

/// Assemble and sign the transaction sweeping every `inputs` output to
/// `destination` through the timelocked refund path.
///
/// Each input's sequence is `csv_height`. The fee is
/// `(4 * base_size + estimated witness) * fee_rate_sat_per_kw / 1000`, and
/// what remains must be above the destination's dust limit.
pub fn build_refund_tx(
    inputs: &[RepayData],
    destination: ScriptBuf,
    csv_height: u32,
    fee_rate_sat_per_kw: u64,
) -> Result<Transaction, SwapError> {
    if inputs.is_empty() {
        return Err(SwapError::InvalidInput("no refund inputs".into()));
    }

    let mut tx_in = Vec::with_capacity(inputs.len());
    let mut total_sat: u64 = 0;
    let mut witness_estimate: u64 = 0;
    for (idx, input) in inputs.iter().enumerate() {
        let txid = Txid::from_str(&input.txid)
            .map_err(|e| SwapError::InvalidInput(format!("input {idx} txid: {e}")))?;
        tracing::debug!(
            idx,
            txid = %txid,
            index = input.index,
            amount_sat = input.amount_sat,
            "refund input"
        );
        tx_in.push(TxIn {
            previous_output: OutPoint::new(txid, input.index),
            script_sig: ScriptBuf::new(),
            sequence: Sequence(csv_height),
            witness: Witness::new(),
        });
        total_sat = total_sat
            .checked_add(input.amount_sat)
            .ok_or_else(|| SwapError::InvalidInput("input amounts overflow".into()))?;
        witness_estimate += witness_size(&input.script);
    }

    let mut tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: tx_in,
        output: vec![TxOut {
            value: Amount::ZERO,
            script_pubkey: destination,
        }],
    };

    let weight = 4 * tx.base_size() as u64 + witness_estimate;
    let fee_sat = weight * fee_rate_sat_per_kw / 1000;
    let dust_sat = tx.output[0].script_pubkey.minimal_non_dust().to_sat();
    if total_sat < fee_sat.saturating_add(dust_sat) {
        tracing::warn!(total_sat, fee_sat, dust_sat, "refund output would be dust");
        return Err(SwapError::InsufficientFunds { total_sat, fee_sat });
    }
    tx.output[0].value = Amount::from_sat(total_sat - fee_sat);
    tracing::debug!(weight, fee_sat, output_sat = total_sat - fee_sat, "refund fee");

    let witnesses = sign_inputs(&tx, inputs)?;
    for (txin, witness) in tx.input.iter_mut().zip(witnesses) {
        txin.witness = witness;
    }
    Ok(tx)
}

/// Refund-path witness `[sig, <empty>, script]` for every input.
fn sign_inputs(tx: &Transaction, inputs: &[RepayData]) -> Result<Vec<Witness>, SwapError> {
    let secp = Secp256k1::signing_only();
    let mut cache = SighashCache::new(tx);
    let mut witnesses = Vec::with_capacity(inputs.len());

    for (idx, input) in inputs.iter().enumerate() {
        let script = Script::from_bytes(&input.script);
        let sighash = cache
            .p2wsh_signature_hash(
                idx,
                script,
                Amount::from_sat(input.amount_sat),
                EcdsaSighashType::All,
            )
            .map_err(|e| SwapError::Signing(format!("input {idx} sighash: {e}")))?;
        let key = SecretKey::from_slice(&input.refund_privkey)
            .map_err(|e| SwapError::Signing(format!("input {idx} key: {e}")))?;
        let msg = Message::from_digest(sighash.to_byte_array());
        let signature = bitcoin::ecdsa::Signature {
            signature: secp.sign_ecdsa(&msg, &key),
            sighash_type: EcdsaSighashType::All,
        };

        let empty: &[u8] = &[];
        witnesses.push(Witness::from_slice(&[
            signature.to_vec().as_slice(),
            empty,
            input.script.as_slice(),
        ]));
    }
    Ok(witnesses)
}
