//! Tests for the Venus3 command catalog against a scripted board

use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use venuslink_core::device::{
    AsicDevice, BrightnessBoost, DeviceError, InputSource, LabbControl, Orientation, Rgb,
    RgbEnable, TestPattern, Venus3,
};
use venuslink_core::protocol::{
    decode, Connection, ConnectionConfig, DataFrame, Frame, ProtocolError, Side, StreamChannel,
};

/// Board stand-in: one scripted reply per command, released when the
/// command is written; commands are captured for inspection
#[derive(Clone, Default)]
struct ScriptedBoard {
    replies: Arc<Mutex<VecDeque<Vec<u8>>>>,
    pending: Arc<Mutex<VecDeque<u8>>>,
    written: Arc<Mutex<Vec<u8>>>,
}

impl ScriptedBoard {
    fn ack(&self) -> &Self {
        self.script(&[Frame::Ack])
    }

    fn nack(&self) -> &Self {
        self.script(&[Frame::Nack])
    }

    fn reply(&self, id: u8, side: Side, payload: &[u8]) -> &Self {
        let data = Frame::Data(DataFrame::new(id, side, payload.to_vec()));
        self.script(&[data, Frame::Ack])
    }

    fn script(&self, frames: &[Frame]) -> &Self {
        let bytes = frames
            .iter()
            .flat_map(|frame| frame.to_bytes().unwrap())
            .collect();
        self.replies.lock().unwrap().push_back(bytes);
        self
    }

    /// Decoded commands written by the host
    fn commands(&self) -> Vec<DataFrame> {
        self.written
            .lock()
            .unwrap()
            .split(|&b| b == 0)
            .filter(|line| !line.is_empty())
            .map(|line| match decode(line).unwrap() {
                Frame::Data(data) => data,
                other => panic!("host sent {:?}", other),
            })
            .collect()
    }
}

impl Read for ScriptedBoard {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut pending = self.pending.lock().unwrap();
        let n = buf.len().min(pending.len());
        for (slot, byte) in buf.iter_mut().zip(pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for ScriptedBoard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.lock().unwrap().extend_from_slice(buf);
        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            self.pending.lock().unwrap().extend(reply);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn venus(board: &ScriptedBoard) -> Venus3 {
    let mut conn = Connection::new(ConnectionConfig {
        timeout_ms: 20,
        ..ConnectionConfig::default()
    });
    conn.attach(Box::new(StreamChannel::new(board.clone())))
        .unwrap();
    Venus3::new(conn)
}

#[test]
fn test_set_rgb_currents_payload() {
    let board = ScriptedBoard::default();
    board.ack();
    let mut dlp = venus(&board);

    dlp.set_rgb_currents(Side::Left, Rgb::new(200, 200, 200))
        .unwrap();

    assert_eq!(
        board.commands(),
        vec![DataFrame::new(0x54, Side::Left, vec![200, 0, 200, 0, 200, 0])]
    );
}

#[test]
fn test_set_rgb_currents_range_checked() {
    let board = ScriptedBoard::default();
    let mut dlp = venus(&board);

    let err = dlp
        .set_rgb_currents(Side::Both, Rgb::new(200, 11, 200))
        .unwrap_err();
    assert!(matches!(err, DeviceError::InvalidParameter { name: "green", .. }));
    let err = dlp
        .set_rgb_currents(Side::Both, Rgb::new(351, 200, 200))
        .unwrap_err();
    assert!(matches!(err, DeviceError::InvalidParameter { name: "red", .. }));
    assert!(board.commands().is_empty());
}

#[test]
fn test_get_rgb_currents() {
    let board = ScriptedBoard::default();
    board.reply(0x55, Side::Right, &[0x5E, 0x01, 200, 0, 12, 0]);
    let mut dlp = venus(&board);

    assert_eq!(
        dlp.get_rgb_currents(Side::Right).unwrap(),
        Rgb::new(350, 200, 12)
    );
    assert_eq!(
        board.commands(),
        vec![DataFrame::new(0x55, Side::Right, vec![])]
    );
}

#[test]
fn test_get_requires_single_side() {
    let board = ScriptedBoard::default();
    let mut dlp = venus(&board);

    assert!(matches!(
        dlp.get_image_freeze(Side::Both),
        Err(DeviceError::SideNotReadable(Side::Both))
    ));
    assert!(board.commands().is_empty());
}

#[test]
fn test_input_source_roundtrip() {
    let board = ScriptedBoard::default();
    board.ack().reply(0x06, Side::Left, &[1]);
    let mut dlp = venus(&board);

    dlp.set_input_source(Side::Left, InputSource::TestPatternGenerator)
        .unwrap();
    assert_eq!(
        dlp.get_input_source(Side::Left).unwrap(),
        InputSource::TestPatternGenerator
    );

    let commands = board.commands();
    assert_eq!(commands[0], DataFrame::new(0x05, Side::Left, vec![1]));
    assert_eq!(commands[1], DataFrame::new(0x06, Side::Left, vec![]));
}

#[test]
fn test_unknown_input_source() {
    let board = ScriptedBoard::default();
    board.reply(0x06, Side::Left, &[9]);
    let mut dlp = venus(&board);

    assert!(matches!(
        dlp.get_input_source(Side::Left),
        Err(DeviceError::UnknownValue { value: 9, .. })
    ));
}

#[test]
fn test_orientation_and_freeze() {
    let board = ScriptedBoard::default();
    board
        .ack()
        .reply(0x15, Side::Left, &[0x02])
        .ack()
        .reply(0x1B, Side::Left, &[0x01]);
    let mut dlp = venus(&board);

    let orientation = Orientation {
        flip_x: true,
        flip_y: false,
        rot_90: false,
    };
    dlp.set_image_orientation(Side::Left, orientation).unwrap();
    assert_eq!(dlp.get_image_orientation(Side::Left).unwrap(), orientation);
    dlp.set_image_freeze(Side::Left, true).unwrap();
    assert!(dlp.get_image_freeze(Side::Left).unwrap());

    let ids: Vec<(u8, Vec<u8>)> = board
        .commands()
        .into_iter()
        .map(|c| (c.command_id, c.payload))
        .collect();
    assert_eq!(
        ids,
        vec![
            (0x14, vec![0x02]),
            (0x15, vec![]),
            (0x1A, vec![0x01]),
            (0x1B, vec![]),
        ]
    );
}

#[test]
fn test_test_pattern_and_rgb_enable() {
    let board = ScriptedBoard::default();
    board.ack().ack().reply(0x53, Side::Right, &[0x06]);
    let mut dlp = venus(&board);

    dlp.set_test_pattern(Side::Both, TestPattern::Checkerboard)
        .unwrap();
    dlp.set_rgb_enable(
        Side::Both,
        RgbEnable {
            red: true,
            green: true,
            blue: false,
        },
    )
    .unwrap();
    assert_eq!(
        dlp.get_rgb_enable(Side::Right).unwrap(),
        RgbEnable {
            red: false,
            green: true,
            blue: true,
        }
    );

    let commands = board.commands();
    assert_eq!(commands[0], DataFrame::new(0x0B, Side::Both, vec![7]));
    assert_eq!(commands[1], DataFrame::new(0x52, Side::Both, vec![0x03]));
}

#[test]
fn test_look_and_caic() {
    let board = ScriptedBoard::default();
    board
        .reply(0x23, Side::Left, &[1, 4, 0x78, 0x00, 0x00, 0x00])
        .ack()
        .reply(0x51, Side::Left, &[0x00]);
    let mut dlp = venus(&board);

    let look = dlp.get_look(Side::Left).unwrap();
    assert_eq!(
        (look.look_id, look.sequence_id, look.frame_rate),
        (1, 4, 120)
    );
    dlp.set_caic_enable(Side::Left, true).unwrap();
    assert!(!dlp.get_caic_enable(Side::Left).unwrap());
}

#[test]
fn test_brightness_boost() {
    let board = ScriptedBoard::default();
    board.ack().reply(0x81, Side::Left, &[0x51, 0x80, 0x10]);
    let mut dlp = venus(&board);

    dlp.set_brightness_boost(
        Side::Both,
        BrightnessBoost {
            sharpness: 15,
            control: LabbControl::Manual,
            manual_setting: 0xFF,
        },
    )
    .unwrap();
    let status = dlp.get_brightness_boost(Side::Left).unwrap();
    assert_eq!(status.settings.sharpness, 5);
    assert_eq!(status.settings.control, LabbControl::Manual);
    assert_eq!(status.settings.manual_setting, 0x80);
    assert_eq!(status.gain, 0x10);

    assert_eq!(
        board.commands()[0],
        DataFrame::new(0x80, Side::Both, vec![0xF1, 0xFF])
    );

    let err = dlp
        .set_brightness_boost(
            Side::Left,
            BrightnessBoost {
                sharpness: 16,
                control: LabbControl::Disabled,
                manual_setting: 0,
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        DeviceError::InvalidParameter {
            name: "sharpness",
            ..
        }
    ));
}

#[test]
fn test_identification() {
    let board = ScriptedBoard::default();
    board
        .reply(0xD4, Side::Left, &[4])
        .reply(0xD5, Side::Left, &[0x60, 0x0D, 0x00, 0x68])
        .reply(0xD9, Side::Left, &[0x05, 0x00, 2, 1]);
    let mut dlp = venus(&board);

    assert_eq!(
        dlp.get_asic_device_id(Side::Left).unwrap(),
        AsicDevice::Dlp3435
    );
    let dmd = dlp.get_dmd_device_id(Side::Left).unwrap();
    assert_eq!(dmd.type_hex(), "68000D60");
    assert_eq!(
        dlp.get_flash_version(Side::Left).unwrap().to_string(),
        "1.2.5"
    );
}

#[test]
fn test_short_response() {
    let board = ScriptedBoard::default();
    board.reply(0x26, Side::Left, &[1, 0, 2]);
    let mut dlp = venus(&board);

    assert!(matches!(
        dlp.get_rgb_duty_cycle(Side::Left),
        Err(DeviceError::ShortResponse {
            expected: 6,
            actual: 3,
            ..
        })
    ));
}

#[test]
fn test_rejected_command() {
    let board = ScriptedBoard::default();
    board.nack();
    let mut dlp = venus(&board);

    assert!(matches!(
        dlp.set_look(Side::Right, 2),
        Err(DeviceError::Protocol(ProtocolError::CommandRejected))
    ));
}

#[test]
fn test_duty_cycle_roundtrip() {
    let board = ScriptedBoard::default();
    board
        .ack()
        .reply(0x26, Side::Left, &[0x00, 0x10, 0x00, 0x20, 0x00, 0x30]);
    let mut dlp = venus(&board);

    dlp.set_rgb_duty_cycle(Side::Left, Rgb::new(0x1000, 0x2000, 0x3000))
        .unwrap();
    assert_eq!(
        dlp.get_rgb_duty_cycle(Side::Left).unwrap(),
        Rgb::new(0x1000, 0x2000, 0x3000)
    );
    assert_eq!(
        board.commands()[0].payload,
        vec![0x00, 0x10, 0x00, 0x20, 0x00, 0x30]
    );
}
