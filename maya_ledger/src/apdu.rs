use core::fmt;

use ledger_apdu::APDUCommand;

pub type APDUCmdVec = APDUCommand<Vec<u8>>;

/// Class byte of every command of the app
pub const CLA: u8 = 0x55;

/// Maximum payload of a single sign chunk
pub const CHUNK_SIZE: usize = 250;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Ins {
    GetVersion = 0x00,
    SignSecp256k1 = 0x02,
    GetAddrSecp256k1 = 0x04,
}

/// P1 of the chunks of a sign command
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ChunkPayloadType {
    /// First chunk, carries the derivation path
    Init = 0x00,
    Add = 0x01,
    Last = 0x02,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatusWord {
    /// Success
    OK,
    ExecutionError,
    WrongLength,
    EmptyBuffer,
    OutputBufferTooSmall,
    DataIsInvalid,
    ConditionsNotSatisfied,
    /// Rejected by user
    TransactionRejected,
    BadKeyHandle,
    InvalidP1P2,
    InsNotSupported,
    /// Returned when the app is not open
    ClaNotSupported,
    UnknownError,
    SignVerifyError,
    Unknown(u16),
}

impl StatusWord {
    pub fn code(&self) -> u16 {
        match self {
            StatusWord::OK => 0x9000,
            StatusWord::ExecutionError => 0x6400,
            StatusWord::WrongLength => 0x6700,
            StatusWord::EmptyBuffer => 0x6982,
            StatusWord::OutputBufferTooSmall => 0x6983,
            StatusWord::DataIsInvalid => 0x6984,
            StatusWord::ConditionsNotSatisfied => 0x6985,
            StatusWord::TransactionRejected => 0x6986,
            StatusWord::BadKeyHandle => 0x6a80,
            StatusWord::InvalidP1P2 => 0x6b00,
            StatusWord::InsNotSupported => 0x6d00,
            StatusWord::ClaNotSupported => 0x6e00,
            StatusWord::UnknownError => 0x6f00,
            StatusWord::SignVerifyError => 0x6f01,
            StatusWord::Unknown(code) => *code,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StatusWord::OK => "No errors",
            StatusWord::ExecutionError => "Execution Error",
            StatusWord::WrongLength => "Wrong Length",
            StatusWord::EmptyBuffer => "Empty Buffer",
            StatusWord::OutputBufferTooSmall => "Output buffer too small",
            StatusWord::DataIsInvalid => "Data is invalid",
            StatusWord::ConditionsNotSatisfied => "Conditions not satisfied",
            StatusWord::TransactionRejected => "Transaction rejected",
            StatusWord::BadKeyHandle => "Bad key handle",
            StatusWord::InvalidP1P2 => "Invalid P1/P2",
            StatusWord::InsNotSupported => "Instruction not supported",
            StatusWord::ClaNotSupported => "App does not seem to be open",
            StatusWord::UnknownError => "Unknown error",
            StatusWord::SignVerifyError => "Sign/verify error",
            StatusWord::Unknown(_) => "Unknown Status Code",
        }
    }
}

impl From<u16> for StatusWord {
    fn from(value: u16) -> Self {
        match value {
            0x9000 => StatusWord::OK,
            0x6400 => StatusWord::ExecutionError,
            0x6700 => StatusWord::WrongLength,
            0x6982 => StatusWord::EmptyBuffer,
            0x6983 => StatusWord::OutputBufferTooSmall,
            0x6984 => StatusWord::DataIsInvalid,
            0x6985 => StatusWord::ConditionsNotSatisfied,
            0x6986 => StatusWord::TransactionRejected,
            0x6a80 => StatusWord::BadKeyHandle,
            0x6b00 => StatusWord::InvalidP1P2,
            0x6d00 => StatusWord::InsNotSupported,
            0x6e00 => StatusWord::ClaNotSupported,
            0x6f00 => StatusWord::UnknownError,
            0x6f01 => StatusWord::SignVerifyError,
            other => StatusWord::Unknown(other),
        }
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04x})", self.description(), self.code())
    }
}

pub fn apdu(ins: Ins, p1: u8, data: Vec<u8>) -> APDUCmdVec {
    APDUCmdVec {
        cla: CLA,
        ins: ins as u8,
        p1,
        p2: 0x00,
        data,
    }
}
