use matter_model::*;

#[test]
fn test_feature_codes_round_trip() {
    for bit in 0u8..32 {
        let code = encode_feature("OO", bit);
        assert_eq!(decode_id(&code, ElementMarker::Feature).unwrap(), u32::from(bit), "{code}");
    }
}

#[test]
fn test_attribute_codes_round_trip() {
    for id in (0u16..=0x0100).chain([0x4000, 0x400a, 0xfff8, 0xfffd]) {
        let code = encode_attribute("CC", id);
        assert_eq!(decode_id(&code, ElementMarker::Attribute).unwrap(), u32::from(id), "{code}");
    }
}

#[test]
fn test_command_codes_round_trip_both_directions() {
    for direction in [CommandDirection::Accepted, CommandDirection::Generated] {
        for id in 0u8..=0xff {
            let code = encode_command("LVL", id, direction);
            assert_eq!(decode_id(&code, ElementMarker::Command).unwrap(), u32::from(id), "{code}");
            assert_eq!(command_direction(&code).unwrap(), direction);
        }
    }
}

#[test]
fn test_structured_code_display_and_parse_agree() {
    let codes = [
        PicsCode::usage("OO", PicsSide::Server),
        PicsCode::usage("OO", PicsSide::Client),
        PicsCode::feature("OO", 2),
        PicsCode::attribute("OO", 0x4003),
        PicsCode::command("OO", 0x42, CommandDirection::Accepted),
        PicsCode::command("G", 0x03, CommandDirection::Generated),
    ];
    for code in codes {
        let text = code.to_string();
        let parsed: PicsCode = text.parse().unwrap();
        assert_eq!(parsed, code, "{text}");
    }
}

#[test]
fn test_decode_uses_first_marker_occurrence() {
    // The cluster prefix itself never contains the marker, so the first match wins.
    assert_eq!(decode_id("BINFO.S.A0011", ElementMarker::Attribute).unwrap(), 0x11);
}

#[test]
fn test_decode_ignores_trailing_text_after_id() {
    assert_eq!(decode_id("OO.S.C02.Rsp", ElementMarker::Command).unwrap(), 2);
}

#[test]
fn test_client_side_code_has_no_server_marker() {
    let err = decode_id("OO.C.C00.Tx", ElementMarker::Command).unwrap_err();
    assert!(matches!(err, DecodeError::MarkerNotFound { .. }));
}
