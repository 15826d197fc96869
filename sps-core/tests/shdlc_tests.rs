use sps_core::utils::{
    protocol::shdlc::{self, command, ShdlcError},
    CommandFrame,
};

fn frame(text: &str) -> Vec<u8> {
    hex::decode(text).unwrap()
}

#[test]
fn handshake_frames_carry_valid_checksums() {
    for (text, cmd) in [
        (CommandFrame::DeviceIdentify.hex(), command::DEVICE_INFORMATION),
        (CommandFrame::Start.hex(), command::START_MEASUREMENT),
        (CommandFrame::Read.hex(), command::READ_MEASUREMENT),
        (CommandFrame::Stop.hex(), command::STOP_MEASUREMENT),
    ] {
        let parsed = shdlc::decode_mosi(&frame(text)).unwrap();
        assert_eq!(parsed.address, 0);
        assert_eq!(parsed.command, cmd);
    }
}

#[test]
fn wake_up_is_pulse_plus_two_requests() {
    let bytes = CommandFrame::WakeUp.bytes().unwrap();
    assert_eq!(bytes[0], 0xFF);
    let frames = shdlc::split_frames(&bytes);
    assert_eq!(frames.len(), 2);
    for raw in frames {
        let parsed = shdlc::decode_mosi(raw).unwrap();
        assert_eq!(parsed.command, command::WAKE_UP);
        assert!(parsed.data.is_empty());
    }
}

#[test]
fn encoder_reproduces_literal_frames() {
    let cases: [(CommandFrame, u8, &[u8]); 4] = [
        (CommandFrame::DeviceIdentify, command::DEVICE_INFORMATION, &[0x00]),
        (CommandFrame::Start, command::START_MEASUREMENT, &[0x01, 0x03]),
        (CommandFrame::Read, command::READ_MEASUREMENT, &[]),
        (CommandFrame::Stop, command::STOP_MEASUREMENT, &[]),
    ];
    for (literal, cmd, data) in cases {
        let encoded = shdlc::encode_mosi(0x00, cmd, data).unwrap();
        assert_eq!(hex::encode(encoded), literal.hex(), "{}", literal.name());
    }
}

#[test]
fn checksum_is_inverted_low_byte_of_sum() {
    assert_eq!(shdlc::checksum(&[0x00, 0xD0, 0x01, 0x00]), 0x2E);
    assert_eq!(shdlc::checksum(&[]), 0xFF);
    // sum wraps past 0xFF
    assert_eq!(shdlc::checksum(&[0xFF, 0x02]), !0x01);
}

#[test]
fn reserved_bytes_are_stuffed() {
    let raw = [0x7E, 0x01, 0x7D, 0x11, 0x13];
    let stuffed = shdlc::stuff(&raw);
    assert_eq!(
        stuffed,
        vec![0x7D, 0x5E, 0x01, 0x7D, 0x5D, 0x7D, 0x31, 0x7D, 0x33]
    );
    assert_eq!(shdlc::unstuff(&stuffed).unwrap(), raw);
    assert_eq!(shdlc::unstuff(&[0x01, 0x7D]), Err(ShdlcError::DanglingEscape));
}

#[test]
fn response_with_stuffed_payload_decodes() {
    let encoded = shdlc::encode_miso(0x00, command::READ_MEASUREMENT, 0x00, &[0x7E, 0x13]).unwrap();
    let miso = shdlc::decode_miso(&encoded).unwrap();
    assert_eq!(miso.data, vec![0x7E, 0x13]);
    assert_eq!(miso.state, 0);
}

#[test]
fn malformed_responses_are_reported() {
    assert_eq!(
        shdlc::decode_miso(&frame("00010000fe")),
        Err(ShdlcError::MissingDelimiter)
    );
    assert_eq!(
        shdlc::decode_miso(&frame("7e00017e")),
        Err(ShdlcError::TooShort(2))
    );
    assert_eq!(
        shdlc::decode_miso(&frame("7e00010002fe7e")),
        Err(ShdlcError::LengthMismatch {
            declared: 2,
            actual: 0
        })
    );
    assert_eq!(
        shdlc::decode_miso(&frame("7e00010000fd7e")),
        Err(ShdlcError::Checksum {
            expected: 0xFE,
            actual: 0xFD
        })
    );
}

#[test]
fn device_state_flags() {
    let miso = shdlc::decode_miso(&shdlc::encode_miso(0, 0x03, 0x82, &[]).unwrap()).unwrap();
    assert!(miso.device_error());
    assert_eq!(miso.error_code(), 0x02);
}

#[test]
fn oversized_payload_is_refused() {
    let data = [0u8; 256];
    assert_eq!(
        shdlc::encode_mosi(0, command::READ_MEASUREMENT, &data),
        Err(ShdlcError::DataTooLong(256))
    );
}

#[test]
fn split_skips_noise_between_frames() {
    let stream = frame("ff7e000100fe7e00aa7e000300fc7e7e");
    let frames = shdlc::split_frames(&stream);
    assert_eq!(frames.len(), 2);
    assert_eq!(hex::encode(frames[0]), "7e000100fe7e");
    assert_eq!(hex::encode(frames[1]), "7e000300fc7e");
}

#[test]
fn measurement_needs_exactly_forty_bytes() {
    assert_eq!(shdlc::Measurement::from_be_bytes(&[]), None);
    assert_eq!(shdlc::Measurement::from_be_bytes(&[0u8; 39]), None);

    let data: Vec<u8> = (1..=10).flat_map(|i| (i as f32).to_be_bytes()).collect();
    let m = shdlc::Measurement::from_be_bytes(&data).unwrap();
    assert_eq!(m.mc_1p0, 1.0);
    assert_eq!(m.nc_0p5, 5.0);
    assert_eq!(m.typical_particle_size, 10.0);
}

#[test]
fn device_strings_stop_at_nul() {
    assert_eq!(shdlc::ascii_string(b"00080000\0"), Some("00080000"));
    assert_eq!(shdlc::ascii_string(b"no terminator"), Some("no terminator"));
    assert_eq!(shdlc::ascii_string(&[0xC3, 0xA9, 0x00]), None);
}
