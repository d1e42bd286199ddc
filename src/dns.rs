use crate::error::{DecodeError, EncodeError};
use crate::packet::BytePacketBuffer;
use std::collections::HashMap;
use std::net::Ipv4Addr;

/// Size of the fixed header; the question section starts right after it.
pub const HEADER_LEN: usize = 12;
pub const DEFAULT_TTL: u32 = 600;
/// QR, RD and RA set, opcode QUERY, rcode NOERROR.
pub const RESPONSE_FLAGS: u16 = 0x8180;
pub const CLASS_IN: u16 = 1;

const POINTER_TAG: u16 = 0xC000;
const MAX_POINTER_OFFSET: usize = 0x3FFF;
const ADDRESS_LEN: u16 = 4;

/// Addresses resolved for each question name of one request.
pub type Resolutions = HashMap<String, Vec<Ipv4Addr>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// identifier assigned by the program that generates any kind of query
    pub id: u16,
    /// raw flag word, kept as received
    pub flags: u16,
    /// the number of entries in the question section
    pub qdcount: u16,
    /// the number of resource records in the answer section
    pub ancount: u16,
    /// the number of name server resource records in the authority records section
    pub nscount: u16,
    /// the number of resource records in the additional records section
    pub arcount: u16,
}

impl Header {
    pub fn new(id: u16, flags: u16) -> Self {
        Self {
            id,
            flags,
            qdcount: 0,
            ancount: 0,
            nscount: 0,
            arcount: 0,
        }
    }

    pub fn response(&self) -> bool {
        self.flags & 0x8000 != 0
    }

    pub fn opcode(&self) -> u8 {
        ((self.flags >> 11) & 0x0F) as u8
    }

    pub fn recursion_desired(&self) -> bool {
        self.flags & 0x0100 != 0
    }

    pub fn recursion_available(&self) -> bool {
        self.flags & 0x0080 != 0
    }

    /// Response code; 0 is NOERROR.
    pub fn rcode(&self) -> u8 {
        (self.flags & 0x0F) as u8
    }

    fn read(buffer: &mut BytePacketBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            id: buffer.read_u16()?,
            flags: buffer.read_u16()?,
            qdcount: buffer.read_u16()?,
            ancount: buffer.read_u16()?,
            nscount: buffer.read_u16()?,
            arcount: buffer.read_u16()?,
        })
    }

    pub fn write(&self, buffer: &mut BytePacketBuffer) {
        buffer.write_u16(self.id);
        buffer.write_u16(self.flags);
        buffer.write_u16(self.qdcount);
        buffer.write_u16(self.ancount);
        buffer.write_u16(self.nscount);
        buffer.write_u16(self.arcount);
    }
}

/// Query type as received. Every type is answered with an address record,
/// so only A is singled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    /// 1 a host address
    A,
    /// any other type, echoed back unchanged
    UNKNOWN(u16),
}

impl From<u16> for QueryType {
    fn from(num: u16) -> Self {
        match num {
            1 => QueryType::A,
            _ => QueryType::UNKNOWN(num),
        }
    }
}

impl From<QueryType> for u16 {
    fn from(qtype: QueryType) -> Self {
        match qtype {
            QueryType::A => 1,
            QueryType::UNKNOWN(num) => num,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// raw labels, re-emitted byte for byte
    pub labels: Vec<Vec<u8>>,
    /// lower-cased dotted form used for lookups
    pub qname: String,
    pub qtype: QueryType,
    pub qclass: u16,
}

impl Question {
    pub fn new(qname: &str, qtype: QueryType) -> Self {
        let labels = qname
            .split('.')
            .filter(|label| !label.is_empty())
            .map(|label| label.as_bytes().to_vec())
            .collect();

        Self::from_labels(labels, qtype, CLASS_IN)
    }

    fn from_labels(labels: Vec<Vec<u8>>, qtype: QueryType, qclass: u16) -> Self {
        let qname = labels
            .iter()
            .map(|label| String::from_utf8_lossy(label).to_lowercase())
            .collect::<Vec<_>>()
            .join(".");

        Self {
            labels,
            qname,
            qtype,
            qclass,
        }
    }

    fn read(buffer: &mut BytePacketBuffer) -> Result<Self, DecodeError> {
        let labels = buffer.read_labels()?;
        let qtype = QueryType::from(buffer.read_u16()?);
        let qclass = buffer.read_u16()?;

        Ok(Self::from_labels(labels, qtype, qclass))
    }

    pub fn write(&self, buffer: &mut BytePacketBuffer) {
        buffer.write_labels(&self.labels);
        buffer.write_u16(self.qtype.into());
        buffer.write_u16(self.qclass);
    }

    /// Bytes this question occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        let name: usize = self.labels.iter().map(|label| label.len() + 1).sum();

        name + 1 + 4
    }
}

/// An address record whose owner name is a pointer to its question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer {
    pub name_pointer: u16,
    pub qtype: QueryType,
    pub qclass: u16,
    pub ttl: u32,
    pub address: Ipv4Addr,
}

impl Answer {
    pub fn new(
        offset: usize,
        question: &Question,
        address: Ipv4Addr,
        ttl: u32,
    ) -> Result<Self, EncodeError> {
        if offset > MAX_POINTER_OFFSET {
            return Err(EncodeError::PointerOutOfRange(offset));
        }

        Ok(Self {
            name_pointer: POINTER_TAG | offset as u16,
            qtype: question.qtype,
            qclass: question.qclass,
            ttl,
            address,
        })
    }

    /// Offset of the question this answer points at.
    pub fn offset(&self) -> usize {
        (self.name_pointer & !POINTER_TAG) as usize
    }

    fn read(buffer: &mut BytePacketBuffer) -> Result<Self, DecodeError> {
        let name_pointer = buffer.read_u16()?;
        let qtype = QueryType::from(buffer.read_u16()?);
        let qclass = buffer.read_u16()?;
        let ttl = buffer.read_u32()?;
        let len = buffer.read_u16()?;

        if len != ADDRESS_LEN {
            return Err(DecodeError::UnexpectedDataLength(len));
        }

        let raw_address = buffer.read_u32()?;

        Ok(Self {
            name_pointer,
            qtype,
            qclass,
            ttl,
            address: Ipv4Addr::from(raw_address),
        })
    }

    pub fn write(&self, buffer: &mut BytePacketBuffer) {
        buffer.write_u16(self.name_pointer);
        buffer.write_u16(self.qtype.into());
        buffer.write_u16(self.qclass);
        buffer.write_u32(self.ttl);
        buffer.write_u16(ADDRESS_LEN);
        buffer.write_bytes(&self.address.octets());
    }
}

fn section_count(len: usize) -> Result<u16, EncodeError> {
    u16::try_from(len).map_err(|_| EncodeError::TooManyRecords(len))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub header: Header,
    pub questions: Vec<Question>,
}

impl Request {
    /// Decodes the header and question section. Any records a client put
    /// after the questions are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut buffer = BytePacketBuffer::from_bytes(bytes);
        let header = Header::read(&mut buffer)?;

        let mut questions = Vec::with_capacity(header.qdcount.min(64) as usize);
        for _ in 0..header.qdcount {
            questions.push(Question::read(&mut buffer)?);
        }

        Ok(Self { header, questions })
    }

    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut header = self.header;
        header.qdcount = section_count(self.questions.len())?;
        header.ancount = 0;
        header.nscount = 0;
        header.arcount = 0;

        let mut buffer = BytePacketBuffer::new();
        header.write(&mut buffer);

        for question in &self.questions {
            question.write(&mut buffer);
        }

        Ok(buffer.into_bytes())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
}

impl Response {
    /// Answers every question from `resolutions`, pointing each answer at
    /// the byte offset its question has in the request.
    pub fn build(
        request: &Request,
        resolutions: &Resolutions,
        ttl: u32,
    ) -> Result<Self, EncodeError> {
        let mut answers = Vec::new();
        let mut offset = HEADER_LEN;

        for question in &request.questions {
            if let Some(addresses) = resolutions.get(&question.qname) {
                for address in addresses {
                    answers.push(Answer::new(offset, question, *address, ttl)?);
                }
            }

            offset += question.encoded_len();
        }

        let mut header = Header::new(request.header.id, RESPONSE_FLAGS);
        header.qdcount = section_count(request.questions.len())?;
        header.ancount = section_count(answers.len())?;

        Ok(Self {
            header,
            questions: request.questions.clone(),
            answers,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut header = self.header;
        header.qdcount = section_count(self.questions.len())?;
        header.ancount = section_count(self.answers.len())?;
        header.nscount = 0;
        header.arcount = 0;

        let mut buffer = BytePacketBuffer::new();
        header.write(&mut buffer);

        for question in &self.questions {
            question.write(&mut buffer);
        }

        for answer in &self.answers {
            answer.write(&mut buffer);
        }

        Ok(buffer.into_bytes())
    }

    /// Decodes a response produced by [`Response::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut buffer = BytePacketBuffer::from_bytes(bytes);
        let header = Header::read(&mut buffer)?;

        let mut questions = Vec::with_capacity(header.qdcount.min(64) as usize);
        for _ in 0..header.qdcount {
            questions.push(Question::read(&mut buffer)?);
        }

        let mut answers = Vec::with_capacity(header.ancount.min(256) as usize);
        for _ in 0..header.ancount {
            answers.push(Answer::read(&mut buffer)?);
        }

        Ok(Self {
            header,
            questions,
            answers,
        })
    }
}
