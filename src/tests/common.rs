// src/tests/common.rs

//! Common data, record builders, and temporary files for tests.

#![allow(non_upper_case_globals)]

use crate::common::FPath;
use crate::data::datetime::{FixedOffset, TimeNormalizer};
use crate::data::layout::linux_x86::{
    LASTLOG_SZ,
    LL_HOST_OFFSET,
    LL_LINE_OFFSET,
    LL_TIME_OFFSET,
    UTMPX_SZ,
    UT_ADDR_V6_OFFSET,
    UT_EXIT_OFFSET,
    UT_HOST_OFFSET,
    UT_ID_OFFSET,
    UT_LINE_OFFSET,
    UT_PID_OFFSET,
    UT_SESSION_OFFSET,
    UT_TV_OFFSET,
    UT_TYPE_OFFSET,
    UT_USER_OFFSET,
};
use crate::debug::helpers::{create_temp_file_bytes, ntf_fpath, NamedTempFile};

use ::lazy_static::lazy_static;

/// Write `text` into `buffer` at `at`, leaving the rest of the field NUL.
fn put_text(buffer: &mut [u8], at: usize, text: &str) {
    let bytes = text.as_bytes();
    buffer[at..at + bytes.len()].copy_from_slice(bytes);
}

/// Values of one `utmpx` record, see [`UtmpxFixture::to_bytes`].
#[derive(Clone, Debug, Default)]
pub struct UtmpxFixture {
    pub ut_type: i16,
    pub pid: i32,
    pub line: &'static str,
    pub id: &'static str,
    pub user: &'static str,
    pub host: &'static str,
    pub exit: (i16, i16),
    pub session: i32,
    pub tv_sec: i32,
    pub tv_usec: i32,
    /// first 32-bit word of `ut_addr_v6`
    pub addr: u32,
}

impl UtmpxFixture {
    /// The 384 byte on-disk form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer: Vec<u8> = vec![0; UTMPX_SZ];
        buffer[UT_TYPE_OFFSET..UT_TYPE_OFFSET + 2].copy_from_slice(&self.ut_type.to_le_bytes());
        buffer[UT_PID_OFFSET..UT_PID_OFFSET + 4].copy_from_slice(&self.pid.to_le_bytes());
        put_text(&mut buffer, UT_LINE_OFFSET, self.line);
        put_text(&mut buffer, UT_ID_OFFSET, self.id);
        put_text(&mut buffer, UT_USER_OFFSET, self.user);
        put_text(&mut buffer, UT_HOST_OFFSET, self.host);
        buffer[UT_EXIT_OFFSET..UT_EXIT_OFFSET + 2].copy_from_slice(&self.exit.0.to_le_bytes());
        buffer[UT_EXIT_OFFSET + 2..UT_EXIT_OFFSET + 4].copy_from_slice(&self.exit.1.to_le_bytes());
        buffer[UT_SESSION_OFFSET..UT_SESSION_OFFSET + 4].copy_from_slice(&self.session.to_le_bytes());
        buffer[UT_TV_OFFSET..UT_TV_OFFSET + 4].copy_from_slice(&self.tv_sec.to_le_bytes());
        buffer[UT_TV_OFFSET + 4..UT_TV_OFFSET + 8].copy_from_slice(&self.tv_usec.to_le_bytes());
        buffer[UT_ADDR_V6_OFFSET..UT_ADDR_V6_OFFSET + 4].copy_from_slice(&self.addr.to_le_bytes());

        buffer
    }
}

/// The 292 byte on-disk form of one `lastlog` record.
pub fn lastlog_bytes(ll_time: u32, line: &str, host: &str) -> Vec<u8> {
    let mut buffer: Vec<u8> = vec![0; LASTLOG_SZ];
    buffer[LL_TIME_OFFSET..LL_TIME_OFFSET + 4].copy_from_slice(&ll_time.to_le_bytes());
    put_text(&mut buffer, LL_LINE_OFFSET, line);
    put_text(&mut buffer, LL_HOST_OFFSET, host);

    buffer
}

/// 2023-11-14 22:13:20 UTC
pub const TV_SEC_1: i32 = 1_700_000_000;
/// `TV_SEC_1` at +08:00
pub const TV_SEC_1_P8: &str = "2023-11-15 06:13:20";

lazy_static! {
    pub static ref FO_0: FixedOffset = FixedOffset::east_opt(0).unwrap();
    pub static ref FO_P8: FixedOffset = FixedOffset::east_opt(8 * 3600).unwrap();
    pub static ref FO_M5: FixedOffset = FixedOffset::west_opt(5 * 3600).unwrap();
    pub static ref TN_P8: TimeNormalizer = TimeNormalizer::new(*FO_P8);
    pub static ref TN_0: TimeNormalizer = TimeNormalizer::new(*FO_0);

    /// a `USER_PROCESS` login of "alice" from 127.0.0.1
    pub static ref UTMPX_USER: UtmpxFixture = UtmpxFixture {
        ut_type: 7,
        pid: 4242,
        line: "pts/0",
        id: "ts/0",
        user: "alice",
        host: "example.com",
        exit: (0, 0),
        session: 17,
        tv_sec: TV_SEC_1,
        tv_usec: 500_000,
        addr: 0x0100007F,
    };
    /// a `DEAD_PROCESS` record with an exit status
    pub static ref UTMPX_DEAD: UtmpxFixture = UtmpxFixture {
        ut_type: 8,
        pid: 4242,
        line: "pts/0",
        id: "ts/0",
        exit: (1, 2),
        session: 17,
        tv_sec: TV_SEC_1 + 60,
        ..Default::default()
    };
    /// a `BOOT_TIME` record
    pub static ref UTMPX_BOOT: UtmpxFixture = UtmpxFixture {
        ut_type: 2,
        line: "~",
        id: "~~",
        user: "reboot",
        host: "6.1.0-18-amd64",
        tv_sec: TV_SEC_1 - 3600,
        ..Default::default()
    };

    pub static ref UTMPX_USER_BYTES: Vec<u8> = UTMPX_USER.to_bytes();
    /// three records; boot, user, dead
    pub static ref UTMPX_3RECORD_BYTES: Vec<u8> = {
        let mut data = UTMPX_BOOT.to_bytes();
        data.extend(UTMPX_USER.to_bytes());
        data.extend(UTMPX_DEAD.to_bytes());
        data
    };

    pub static ref NTF_EMPTY: NamedTempFile = create_temp_file_bytes(&[]);
    pub static ref NTF_EMPTY_FPATH: FPath = ntf_fpath(&NTF_EMPTY);
    pub static ref NTF_UTMPX_3RECORD: NamedTempFile = create_temp_file_bytes(&UTMPX_3RECORD_BYTES);
    pub static ref NTF_UTMPX_3RECORD_FPATH: FPath = ntf_fpath(&NTF_UTMPX_3RECORD);

    /// `lastlog` of ids 0 to 3; id 0 never logged in, id 1 and 3 logged in,
    /// id 2 never logged in
    pub static ref LASTLOG_4RECORD_BYTES: Vec<u8> = {
        let mut data = lastlog_bytes(0, "", "");
        data.extend(lastlog_bytes(TV_SEC_1 as u32, "pts/1", "10.0.0.1"));
        data.extend(lastlog_bytes(0, "", ""));
        data.extend(lastlog_bytes(TV_SEC_1 as u32 + 1, "tty1", ""));
        data
    };
    pub static ref NTF_LASTLOG_4RECORD: NamedTempFile = create_temp_file_bytes(&LASTLOG_4RECORD_BYTES);
    pub static ref NTF_LASTLOG_4RECORD_FPATH: FPath = ntf_fpath(&NTF_LASTLOG_4RECORD);
}
