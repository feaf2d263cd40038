//! VM script assembly.

use crate::{
    args::{Arg, ArgType, ContractParam, convert_param, convert_params},
    error::PrimitiveError,
    hash::ScriptHash,
    hash::hash256_from_str,
    invocation::ContractInvocation,
};
use alloy_primitives::{Bytes, I256, hex};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// VM opcodes used by the builder.
#[allow(missing_docs)]
pub mod opcode {
    pub const PUSHINT8: u8 = 0x00;
    pub const PUSHT: u8 = 0x08;
    pub const PUSHF: u8 = 0x09;
    pub const PUSHNULL: u8 = 0x0b;
    pub const PUSHDATA1: u8 = 0x0c;
    pub const PUSHDATA2: u8 = 0x0d;
    pub const PUSHDATA4: u8 = 0x0e;
    pub const PUSHM1: u8 = 0x0f;
    pub const PUSH0: u8 = 0x10;
    pub const ASSERT: u8 = 0x39;
    pub const SYSCALL: u8 = 0x41;
    pub const PACKMAP: u8 = 0xbe;
    pub const PACK: u8 = 0xc0;
    pub const NEWARRAY0: u8 = 0xc2;
}

/// Call flags granting the callee every permission.
pub const CALL_FLAGS_ALL: u8 = 0x0f;

/// Identifier of an interop service: the first four bytes of the SHA-256 of its name.
pub fn interop_hash(name: &str) -> [u8; 4] {
    let digest = Sha256::digest(name.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Verification script of a single-signature account.
pub fn signature_verification_script(public_key: &[u8; 33]) -> Bytes {
    let mut builder = ScriptBuilder::new();
    builder.emit_push_bytes(public_key).emit_syscall("System.Crypto.CheckSig");
    builder.build()
}

/// Invocation script carrying one 64-byte signature.
pub fn signature_invocation_script(signature: &[u8; 64]) -> Bytes {
    let mut builder = ScriptBuilder::new();
    builder.emit_push_bytes(signature);
    builder.build()
}

/// Builds the script for an ordered list of contract calls.
///
/// Every argument is run through [`convert_params`] first.
pub fn build_invocation_script(
    invocations: &[ContractInvocation],
) -> Result<Bytes, PrimitiveError> {
    let mut builder = ScriptBuilder::new();
    for invocation in invocations {
        builder.emit_contract_call(
            &invocation.script_hash,
            &invocation.operation,
            &convert_params(&invocation.args),
        )?;
        if invocation.abort_on_fail {
            builder.emit(opcode::ASSERT);
        }
    }
    Ok(builder.build())
}

#[derive(Clone, Debug, Default)]
pub struct ScriptBuilder {
    script: Vec<u8>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, op: u8) -> &mut Self {
        self.script.push(op);
        self
    }

    pub fn emit_syscall(&mut self, name: &str) -> &mut Self {
        self.emit(opcode::SYSCALL);
        self.script.extend_from_slice(&interop_hash(name));
        self
    }

    pub fn emit_push_bool(&mut self, value: bool) -> &mut Self {
        self.emit(if value { opcode::PUSHT } else { opcode::PUSHF })
    }

    /// Pushes an integer using the smallest encoding that holds it.
    pub fn emit_push_int(&mut self, value: I256) -> &mut Self {
        let le = value.into_raw().to_le_bytes::<32>();
        let fill = if value.is_negative() { 0xff } else { 0x00 };
        let fits = |size: usize| {
            le[size..].iter().all(|b| *b == fill) && (le[size - 1] & 0x80 == fill & 0x80)
        };

        if fits(1) {
            let small = le[0] as i8;
            if (-1..=16).contains(&small) {
                return self.emit((opcode::PUSH0 as i8 + small) as u8);
            }
        }

        let (index, size) = [1usize, 2, 4, 8, 16, 32]
            .into_iter()
            .enumerate()
            .find(|(_, size)| fits(*size))
            .unwrap_or((5, 32));
        self.emit(opcode::PUSHINT8 + index as u8);
        self.script.extend_from_slice(&le[..size]);
        self
    }

    pub fn emit_push_bytes(&mut self, data: &[u8]) -> &mut Self {
        let len = data.len();
        if len < 0x100 {
            self.emit(opcode::PUSHDATA1);
            self.script.push(len as u8);
        } else if len < 0x1_0000 {
            self.emit(opcode::PUSHDATA2);
            self.script.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.emit(opcode::PUSHDATA4);
            self.script.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.script.extend_from_slice(data);
        self
    }

    pub fn emit_push_str(&mut self, value: &str) -> &mut Self {
        self.emit_push_bytes(value.as_bytes())
    }

    /// Pushes the items in reverse, then packs them into an array.
    fn emit_array(&mut self, items: &[ContractParam]) -> Result<&mut Self, PrimitiveError> {
        if items.is_empty() {
            return Ok(self.emit(opcode::NEWARRAY0));
        }
        for item in items.iter().rev() {
            self.emit_param(item)?;
        }
        self.emit_push_int(I256::try_from(items.len()).unwrap_or(I256::ZERO));
        Ok(self.emit(opcode::PACK))
    }

    pub fn emit_param(&mut self, param: &ContractParam) -> Result<&mut Self, PrimitiveError> {
        match param {
            ContractParam::Hash160(hash) => Ok(self.emit_push_bytes(hash.as_le_bytes())),
            ContractParam::Array(items) => self.emit_array(items),
            ContractParam::Raw(arg) => self.emit_raw(arg),
        }
    }

    fn emit_raw(&mut self, arg: &Arg) -> Result<&mut Self, PrimitiveError> {
        let kind = arg.kind.name();
        let Some(value) = arg.value() else {
            return match arg.kind {
                ArgType::Any => Ok(self.emit(opcode::PUSHNULL)),
                _ => Err(PrimitiveError::argument(kind, "missing value")),
            };
        };
        let as_str = || value.as_str().ok_or_else(|| PrimitiveError::argument(kind, "expected a string"));

        match arg.kind {
            ArgType::Any => Err(PrimitiveError::argument(kind, "only null is supported")),
            ArgType::Boolean => {
                let flag = match value {
                    Value::Bool(flag) => *flag,
                    Value::String(s) if s.eq_ignore_ascii_case("true") => true,
                    Value::String(s) if s.eq_ignore_ascii_case("false") => false,
                    _ => return Err(PrimitiveError::argument(kind, "expected a boolean")),
                };
                Ok(self.emit_push_bool(flag))
            }
            ArgType::Integer => {
                let digits = match value {
                    Value::Number(n) => n.to_string(),
                    Value::String(s) => s.trim().to_string(),
                    _ => return Err(PrimitiveError::argument(kind, "expected a number")),
                };
                let int = I256::from_dec_str(&digits)
                    .map_err(|err| PrimitiveError::argument(kind, err.to_string()))?;
                Ok(self.emit_push_int(int))
            }
            ArgType::ByteArray => Ok(self.emit_push_bytes(&STANDARD.decode(as_str()?)?)),
            ArgType::String => Ok(self.emit_push_str(as_str()?)),
            ArgType::Hash160 | ArgType::Address | ArgType::ScriptHash => {
                let hash = ScriptHash::from_address_or_hex(as_str()?)?;
                Ok(self.emit_push_bytes(hash.as_le_bytes()))
            }
            ArgType::Hash256 => Ok(self.emit_push_bytes(hash256_from_str(as_str()?)?.as_slice())),
            ArgType::PublicKey => {
                let key: [u8; 33] = hex::decode_to_array(as_str()?)?;
                Ok(self.emit_push_bytes(&key))
            }
            ArgType::Signature => {
                let signature: [u8; 64] = hex::decode_to_array(as_str()?)?;
                Ok(self.emit_push_bytes(&signature))
            }
            ArgType::Array => {
                let items = Vec::<Arg>::deserialize(value)
                    .map_err(|err| PrimitiveError::argument(kind, err.to_string()))?;
                self.emit_array(&convert_params(&items))
            }
            ArgType::Map => {
                #[derive(Deserialize)]
                struct Entry {
                    key: Arg,
                    value: Arg,
                }
                let entries = Vec::<Entry>::deserialize(value)
                    .map_err(|err| PrimitiveError::argument(kind, err.to_string()))?;
                for entry in entries.iter().rev() {
                    self.emit_param(&convert_param(&entry.value))?;
                    self.emit_param(&convert_param(&entry.key))?;
                }
                self.emit_push_int(I256::try_from(entries.len()).unwrap_or(I256::ZERO));
                Ok(self.emit(opcode::PACKMAP))
            }
        }
    }

    /// Emits a dynamic call: packed arguments, call flags, method, target, then
    /// `System.Contract.Call`.
    pub fn emit_contract_call(
        &mut self,
        script_hash: &ScriptHash,
        operation: &str,
        params: &[ContractParam],
    ) -> Result<&mut Self, PrimitiveError> {
        self.emit_array(params)?;
        self.emit_push_int(I256::try_from(CALL_FLAGS_ALL).unwrap_or(I256::ZERO));
        self.emit_push_str(operation);
        self.emit_push_bytes(script_hash.as_le_bytes());
        Ok(self.emit_syscall("System.Contract.Call"))
    }

    pub fn build(self) -> Bytes {
        self.script.into()
    }
}
