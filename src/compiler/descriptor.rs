//! Binary wire format for a compiled network: a 16-byte header followed
//! by tagged sections.
//!
//! ```text
//! offset  size  field
//! 0       4     magic b"MYCL"
//! 4       4     format version (currently 1)
//! 8       4     section count
//! 12      4     total length in bytes, header included
//!
//! each section: tag[4] + len:u32le + payload[len]
//! tags: FREQ, AGNT, SOCK, ENTR, CODE
//! ```
//!
//! Fields inside each section are packed manually (u32/u16 little-endian,
//! length-prefixed UTF-8 strings) rather than through `serde_json`: this
//! is the one artifact meant to be read by a minimal, dependency-free
//! loader embedded in a host, so it gets a compact, hand-rolled layout
//! the way the rest of the runtime's hot paths do (the arena, the
//! queue, the routing table), instead of a JSON blob in a binary
//! wrapper.

use crate::compiler::ast::FieldType;
use crate::error::IoError;

const MAGIC: [u8; 4] = *b"MYCL";
const FORMAT_VERSION: u32 = 1;

/// A declared frequency and its payload schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyDescriptor {
    /// Assigned numeric id.
    pub id: u32,
    /// Declared name.
    pub name: String,
    /// Payload fields, in declaration order.
    pub fields: Vec<(String, FieldType)>,
}

/// A declared agent and its state schema.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDescriptor {
    /// Assigned numeric id.
    pub id: u32,
    /// Declared name.
    pub name: String,
    /// State fields, in declaration order.
    pub state: Vec<(String, FieldType)>,
}

/// A `source.frequency -> destination` routing binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketDescriptor {
    /// The emitting agent's id.
    pub source_agent: u32,
    /// The routed frequency's id.
    pub frequency: u32,
    /// The receiving agent's id.
    pub destination_agent: u32,
}

/// One bound `(agent, frequency)` reaction, naming the handler a host
/// must bind natively — see [`crate::runtime::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDescriptor {
    /// The agent the handler is bound to.
    pub agent: u32,
    /// The frequency the handler reacts to.
    pub frequency: u32,
    /// Whether this entry has a guard a host must also bind.
    pub has_guard: bool,
    /// The name a host looks up to find the native handler (and guard,
    /// if any) for this entry. Conventionally `"{agent}.{frequency}"`.
    pub handler_name: String,
}

/// A fully compiled network: every declared frequency, agent, socket,
/// and dispatch entry, ready to load into a
/// [`crate::runtime::network::Network`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NetworkDescriptor {
    /// Declared frequencies.
    pub frequencies: Vec<FrequencyDescriptor>,
    /// Declared agents.
    pub agents: Vec<AgentDescriptor>,
    /// Declared sockets.
    pub sockets: Vec<SocketDescriptor>,
    /// Declared dispatch entries.
    pub entries: Vec<EntryDescriptor>,
}

struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    fn u8(&mut self, v: u8) {
        self.bytes.push(v);
    }

    fn u32(&mut self, v: u32) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    fn str(&mut self, s: &str) {
        self.u32(s.len() as u32);
        self.bytes.extend_from_slice(s.as_bytes());
    }

    fn field_type(&mut self, ty: FieldType) {
        self.u8(match ty {
            FieldType::Int => 0,
            FieldType::Float => 1,
            FieldType::Bool => 2,
            FieldType::Text => 3,
        });
    }

    fn fields(&mut self, fields: &[(String, FieldType)]) {
        self.u32(fields.len() as u32);
        for (name, ty) in fields {
            self.str(name);
            self.field_type(*ty);
        }
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], IoError> {
        let end = self.pos + n;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| IoError::MalformedDescriptor("unexpected end of section".to_string()))?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, IoError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, IoError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().expect("4 bytes");
        Ok(u32::from_le_bytes(bytes))
    }

    fn str(&mut self) -> Result<String, IoError> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| IoError::MalformedDescriptor(format!("invalid UTF-8: {e}")))
    }

    fn field_type(&mut self) -> Result<FieldType, IoError> {
        match self.u8()? {
            0 => Ok(FieldType::Int),
            1 => Ok(FieldType::Float),
            2 => Ok(FieldType::Bool),
            3 => Ok(FieldType::Text),
            other => Err(IoError::MalformedDescriptor(format!(
                "unknown field type tag {other}"
            ))),
        }
    }

    fn fields(&mut self) -> Result<Vec<(String, FieldType)>, IoError> {
        let count = self.u32()?;
        (0..count)
            .map(|_| {
                let name = self.str()?;
                let ty = self.field_type()?;
                Ok((name, ty))
            })
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }
}

fn write_section(out: &mut Vec<u8>, tag: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(tag);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
}

impl NetworkDescriptor {
    /// Encodes this descriptor into its binary wire format.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let freq_payload = {
            let mut w = Writer::new();
            w.u32(self.frequencies.len() as u32);
            for f in &self.frequencies {
                w.u32(f.id);
                w.str(&f.name);
                w.fields(&f.fields);
            }
            w.bytes
        };

        let agent_payload = {
            let mut w = Writer::new();
            w.u32(self.agents.len() as u32);
            for a in &self.agents {
                w.u32(a.id);
                w.str(&a.name);
                w.fields(&a.state);
            }
            w.bytes
        };

        let socket_payload = {
            let mut w = Writer::new();
            w.u32(self.sockets.len() as u32);
            for s in &self.sockets {
                w.u32(s.source_agent);
                w.u32(s.frequency);
                w.u32(s.destination_agent);
            }
            w.bytes
        };

        let entry_payload = {
            let mut w = Writer::new();
            w.u32(self.entries.len() as u32);
            for e in &self.entries {
                w.u32(e.agent);
                w.u32(e.frequency);
                w.u8(u8::from(e.has_guard));
                w.str(&e.handler_name);
            }
            w.bytes
        };

        // The CODE section carries no bytecode in this runtime (see the
        // module doc on `crate::runtime::dispatch`); it's kept as an
        // empty, explicitly-present section so a loader can tell "no
        // code" apart from "descriptor predates the CODE section".
        let code_payload: Vec<u8> = Vec::new();

        let mut sections = Vec::new();
        write_section(&mut sections, b"FREQ", &freq_payload);
        write_section(&mut sections, b"AGNT", &agent_payload);
        write_section(&mut sections, b"SOCK", &socket_payload);
        write_section(&mut sections, b"ENTR", &entry_payload);
        write_section(&mut sections, b"CODE", &code_payload);

        let mut out = Vec::with_capacity(16 + sections.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&5u32.to_le_bytes());
        out.extend_from_slice(&((16 + sections.len()) as u32).to_le_bytes());
        out.extend_from_slice(&sections);
        out
    }

    /// Decodes a descriptor previously produced by [`Self::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`IoError::MalformedDescriptor`] if the header magic or
    /// version doesn't match, a section is truncated, or a string isn't
    /// valid UTF-8.
    pub fn decode(bytes: &[u8]) -> Result<Self, IoError> {
        if bytes.len() < 16 {
            return Err(IoError::MalformedDescriptor(
                "input shorter than the 16-byte header".to_string(),
            ));
        }
        if bytes[0..4] != MAGIC {
            return Err(IoError::MalformedDescriptor(
                "bad magic, not a Mycelial descriptor".to_string(),
            ));
        }
        let version = u32::from_le_bytes(bytes[4..8].try_into().expect("4 bytes"));
        if version != FORMAT_VERSION {
            return Err(IoError::MalformedDescriptor(format!(
                "unsupported format version {version}"
            )));
        }
        let total_len = u32::from_le_bytes(bytes[12..16].try_into().expect("4 bytes")) as usize;
        if total_len != bytes.len() {
            return Err(IoError::MalformedDescriptor(format!(
                "header declares {total_len} bytes, got {}",
                bytes.len()
            )));
        }

        let mut descriptor = NetworkDescriptor::default();
        let mut cursor = 16usize;
        while cursor < bytes.len() {
            let tag = bytes
                .get(cursor..cursor + 4)
                .ok_or_else(|| IoError::MalformedDescriptor("truncated section tag".to_string()))?;
            let len_bytes = bytes
                .get(cursor + 4..cursor + 8)
                .ok_or_else(|| IoError::MalformedDescriptor("truncated section length".to_string()))?;
            let len = u32::from_le_bytes(len_bytes.try_into().expect("4 bytes")) as usize;
            let payload = bytes
                .get(cursor + 8..cursor + 8 + len)
                .ok_or_else(|| IoError::MalformedDescriptor("truncated section payload".to_string()))?;
            let mut r = Reader::new(payload);

            match tag {
                b"FREQ" => {
                    let count = r.u32()?;
                    for _ in 0..count {
                        let id = r.u32()?;
                        let name = r.str()?;
                        let fields = r.fields()?;
                        descriptor
                            .frequencies
                            .push(FrequencyDescriptor { id, name, fields });
                    }
                }
                b"AGNT" => {
                    let count = r.u32()?;
                    for _ in 0..count {
                        let id = r.u32()?;
                        let name = r.str()?;
                        let state = r.fields()?;
                        descriptor.agents.push(AgentDescriptor { id, name, state });
                    }
                }
                b"SOCK" => {
                    let count = r.u32()?;
                    for _ in 0..count {
                        let source_agent = r.u32()?;
                        let frequency = r.u32()?;
                        let destination_agent = r.u32()?;
                        descriptor.sockets.push(SocketDescriptor {
                            source_agent,
                            frequency,
                            destination_agent,
                        });
                    }
                }
                b"ENTR" => {
                    let count = r.u32()?;
                    for _ in 0..count {
                        let agent = r.u32()?;
                        let frequency = r.u32()?;
                        let has_guard = r.u8()? != 0;
                        let handler_name = r.str()?;
                        descriptor.entries.push(EntryDescriptor {
                            agent,
                            frequency,
                            has_guard,
                            handler_name,
                        });
                    }
                }
                b"CODE" => {
                    if !r.is_empty() {
                        return Err(IoError::MalformedDescriptor(
                            "non-empty CODE section in a runtime that expects none".to_string(),
                        ));
                    }
                }
                other => {
                    return Err(IoError::MalformedDescriptor(format!(
                        "unknown section tag {:?}",
                        String::from_utf8_lossy(other)
                    )));
                }
            }

            cursor += 8 + len;
        }

        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::{AgentDescriptor, EntryDescriptor, FrequencyDescriptor, NetworkDescriptor, SocketDescriptor};
    use crate::compiler::ast::FieldType;

    fn sample() -> NetworkDescriptor {
        NetworkDescriptor {
            frequencies: vec![FrequencyDescriptor {
                id: 1,
                name: "ping".to_string(),
                fields: vec![("value".to_string(), FieldType::Int)],
            }],
            agents: vec![
                AgentDescriptor {
                    id: 1,
                    name: "sender".to_string(),
                    state: vec![],
                },
                AgentDescriptor {
                    id: 2,
                    name: "receiver".to_string(),
                    state: vec![("total".to_string(), FieldType::Int)],
                },
            ],
            sockets: vec![SocketDescriptor {
                source_agent: 1,
                frequency: 1,
                destination_agent: 2,
            }],
            entries: vec![EntryDescriptor {
                agent: 2,
                frequency: 1,
                has_guard: false,
                handler_name: "receiver.ping".to_string(),
            }],
        }
    }

    #[test]
    fn round_trips_through_encode_decode() {
        let original = sample();
        let bytes = original.encode();
        assert_eq!(&bytes[0..4], b"MYCL");
        let decoded = NetworkDescriptor::decode(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = sample().encode();
        bytes[0] = b'X';
        assert!(NetworkDescriptor::decode(&bytes).is_err());
    }

    #[test]
    fn rejects_truncated_input() {
        let bytes = sample().encode();
        assert!(NetworkDescriptor::decode(&bytes[..bytes.len() - 4]).is_err());
    }

    #[test]
    fn rejects_input_shorter_than_header() {
        assert!(NetworkDescriptor::decode(&[0u8; 4]).is_err());
    }
}
