use std::thread;

use serde::{Deserialize, Serialize};

use payload_token::{Config, Error, Key, Map, PayloadCodec, Value, msgpack};

fn map<'a, I: IntoIterator<Item = (&'a str, Value)>>(entries: I) -> Value {
    Value::Map(entries.into_iter().collect())
}

#[test]
fn hello_world() {
    let codec = PayloadCodec::default();
    let payload = map([("hello", "world".into())]);
    let token = codec.encode(&payload).unwrap();
    assert_eq!(token, "U4iEgaVoZWxsb6V3b3JsZA");
    assert_eq!(codec.decode(&token).unwrap(), payload);
}

#[test]
fn key_order_does_not_change_the_token() {
    let codec = PayloadCodec::default();
    let ab = map([("a", "b".into()), ("c", "d".into())]);
    let ba = map([("c", "d".into()), ("a", "b".into())]);
    assert_eq!(codec.encode(&ab).as_deref(), Ok("sdYIgqFhoWKhY6Fk"));
    assert_eq!(codec.encode(&ba).as_deref(), Ok("sdYIgqFhoWKhY6Fk"));
    assert_eq!(codec.decode("sdYIgqFhoWKhY6Fk").unwrap(), ab);
}

#[test]
fn max_length_is_enforced() {
    let payload = Value::from_iter(["01234567890123456789"]);
    let codec = PayloadCodec::new(Config::new().with_max_length(20)).unwrap();
    assert_eq!(codec.encode(&payload), Err(Error::TooLong { length: 34, max_length: 20 }));
    // the limit is inclusive
    let codec = PayloadCodec::new(Config::new().with_max_length(34)).unwrap();
    let token = codec.encode(&payload).unwrap();
    assert_eq!(token.len(), 34);
    assert_eq!(codec.decode(&token).unwrap(), payload);
    let codec = PayloadCodec::new(Config::new().with_max_length(33)).unwrap();
    assert_eq!(codec.encode(&payload), Err(Error::TooLong { length: 34, max_length: 33 }));
    // unlimited
    let codec = PayloadCodec::new(Config::new().with_max_length(0)).unwrap();
    let token = codec.encode(&payload).unwrap();
    assert_eq!(codec.decode(&token).unwrap(), payload);
}

#[test]
fn garbage_is_rejected() {
    let codec = PayloadCodec::default();
    for token in ["???", "", "YIA8MD1hJjE9YiZjPWQ_", "_YIA8MD1hJjE9YiZjPWQ", "????????", "\0\0\0\0\0", "~~~~~~~~~"] {
        let err = codec.decode(token).unwrap_err();
        assert!(matches!(err, Error::InvalidEncoding|Error::ChecksumMismatch|Error::InvalidPayload(_)),
                "{token:?}: {err:?}");
    }
    assert_eq!(codec.decode("???"), Err(Error::InvalidEncoding));
}

#[test]
fn only_the_url_safe_alphabet_is_accepted() {
    let codec = PayloadCodec::default();
    let token = "WWacl8tAXt0vGp--d85JlgLS0vikMusAwP-RkZGRo2Zvbw";
    assert!(codec.decode(token).is_ok());
    let standard = token.replace('-', "+");
    assert_eq!(codec.decode(&standard), Err(Error::InvalidEncoding));
    assert_eq!(codec.decode("il+nkaVoZWxsbw"), Err(Error::InvalidEncoding));
    assert_eq!(codec.decode("il-nkaVoZWxsbw="), Err(Error::InvalidEncoding));
    assert_eq!(codec.decode(" il-nkaVoZWxsbw"), Err(Error::InvalidEncoding));
    assert_eq!(codec.decode("il-nkaVoZWxsbw"), Ok(Value::from_iter(["hello"])));
}

#[test]
fn large_maps_decode_in_linear_time() {
    let codec = PayloadCodec::default();
    let entries = 200_000i64;
    let payload = Value::Map((1..=entries).map(|n| (n.to_string(), n)).collect());
    let token = codec.encode(&payload).unwrap();
    let started = std::time::Instant::now();
    let decoded = codec.decode(&token).unwrap();
    assert!(started.elapsed() < std::time::Duration::from_secs(10), "{:?}", started.elapsed());
    assert_eq!(decoded.as_map().map(Map::len), Some(entries as usize));
    assert_eq!(decoded.as_map().and_then(|m| m.keys().next()), Some(&Key::from("1")));
}

#[test]
fn nested_integers_stay_integers() {
    let codec = PayloadCodec::default();
    let size = map([("w", 128.into()), ("h", 128.into())]);
    let payload = map([("size", size)]);
    let token = codec.encode(&payload).unwrap();
    assert_eq!(token, "mjAkgaRzaXplgqF3zIChaMyA");
    let decoded = codec.decode(&token).unwrap();
    assert_eq!(decoded, payload);
    let size = decoded.as_map().and_then(|m| m.get("size")).and_then(Value::as_map).unwrap();
    assert_eq!(size.get("w").and_then(Value::as_i64), Some(128));
    assert_eq!(size.get("h").and_then(Value::as_str), None);
    // nested keys keep their order
    assert_eq!(size.keys().collect::<Vec<_>>(), [&Key::from("w"), &Key::from("h")]);
}

#[test]
fn mixed_scalars_round_trip() {
    let codec = PayloadCodec::default();
    let deep = Value::from_iter([Value::from_iter([Value::from_iter([Value::from_iter(["foo"])])])]);
    let payload = Value::Array(vec![
        123.456.into(),
        1234567890.into(),
        (-123456789).into(),
        0.into(),
        Value::Null,
        (-1).into(),
        deep
    ]);
    let token = codec.encode(&payload).unwrap();
    assert_eq!(token, "WWacl8tAXt0vGp--d85JlgLS0vikMusAwP-RkZGRo2Zvbw");
    let decoded = codec.decode(&token).unwrap();
    assert_eq!(decoded, payload);
    let items = decoded.as_array().unwrap();
    assert_eq!(items[0].as_f64(), Some(123.456));
    assert_eq!(items[2].as_i64(), Some(-123456789));
    assert!(items[4].is_null());
    assert_eq!(items[6].as_array().and_then(|a| a[0].as_array()).and_then(|a| a[0].as_array())
                      .and_then(|a| a[0].as_array()).and_then(|a| a[0].as_str()), Some("foo"));
}

#[test]
fn list_and_mixed_maps() {
    let codec = PayloadCodec::default();

    let list = Value::from_iter(["a", "b", "c"]);
    assert_eq!(codec.encode(&list).as_deref(), Ok("EN6lk6FhoWKhYw"));
    assert_eq!(codec.decode("EN6lk6FhoWKhYw").unwrap(), list);

    let mut mixed = Map::new();
    mixed.insert(0, "a");
    mixed.insert(1, "b");
    mixed.insert("c", "d");
    let mixed = Value::Map(mixed);
    assert_eq!(codec.encode(&mixed).as_deref(), Ok("SJMjgwChYQGhYqFjoWQ"));
    assert_eq!(codec.decode("SJMjgwChYQGhYqFjoWQ").unwrap(), mixed);

    let mut mixed = Map::new();
    mixed.insert("a", "b");
    mixed.insert(0, "c");
    mixed.insert(1, "d");
    let token = codec.encode(&Value::Map(mixed)).unwrap();
    assert_eq!(token, "00-ngwChYwGhZKFhoWI");
    let decoded = codec.decode(&token).unwrap();
    let keys: Vec<_> = decoded.as_map().unwrap().keys().cloned().collect();
    assert_eq!(keys, [Key::Int(0), Key::Int(1), Key::from("a")]);
}

#[test]
fn legacy_fixtures() {
    let codec = PayloadCodec::default();
    let fixtures = [
        (map([("src", "profile/18374.jpg".into()), ("size", "160x160".into())]),
         "IfOmgqRzaXplpzE2MHgxNjCjc3JjsXByb2ZpbGUvMTgzNzQuanBn"),
        (map([("size", map([("w", "128".into()), ("h", "128".into())]))]),
         "zqsBgaRzaXplgqF3ozEyOKFoozEyOA"),
        (Value::from_iter(["hello"]), "il-nkaVoZWxsbw"),
    ];
    for (payload, expected) in fixtures {
        assert_eq!(codec.encode(&payload).as_deref(), Ok(expected));
        assert_eq!(codec.decode(expected).unwrap(), payload_token::normalize::normalize(&payload));
    }
}

#[test]
fn encoding_is_deterministic() {
    let codec = PayloadCodec::default();
    let payload = map([("b", 2.into()), ("a10", 10.into()), ("a2", Value::from_iter([1, 2, 3]))]);
    let token = codec.encode(&payload).unwrap();
    for _ in 0..10 {
        assert_eq!(codec.encode(&payload).unwrap(), token);
    }
    assert_eq!(PayloadCodec::default().encode(&payload).unwrap(), token);
}

#[test]
fn tampered_tokens_fail_the_checksum() {
    let codec = PayloadCodec::default();
    for token in ["U4iEgaVoZWxsb6V3b3JsZA", "mjAkgaRzaXplgqF3zIChaMyA", "WWacl8tAXt0vGp--d85JlgLS0vikMusAwP-RkZGRo2Zvbw"] {
        for pos in 0..token.len() {
            for c in ["A", "B"] {
                if &token[pos..pos + 1] == c {
                    continue
                }
                let mut tampered = token.to_string();
                tampered.replace_range(pos..pos + 1, c);
                assert_eq!(codec.decode(&tampered), Err(Error::ChecksumMismatch), "{tampered}");
            }
        }
        assert!(codec.decode(&token[..token.len() - 1]).is_err());
        assert!(codec.decode(&format!("{token}A")).is_err());
    }
}

#[test]
fn salted_tokens() {
    let salted = PayloadCodec::new(Config::new().with_checksum_chars(8).with_private_salt("s3cr3t")).unwrap();
    let payload = Value::from_iter(["hello"]);
    let token = salted.encode(&payload).unwrap();
    assert_eq!(token, "blPSXg_HkaVoZWxsbw");
    assert_eq!(salted.decode(&token).unwrap(), payload);

    let other = PayloadCodec::new(Config::new().with_checksum_chars(8).with_private_salt("s3cr3T")).unwrap();
    assert_eq!(other.decode(&token), Err(Error::ChecksumMismatch));
    assert_ne!(other.encode(&payload).unwrap(), token);
}

#[test]
fn checksum_length_is_configurable() {
    let payload = map([("hello", "world".into())]);
    for chars in 0..=27 {
        let codec = PayloadCodec::new(Config::new().with_checksum_chars(chars)).unwrap();
        let token = codec.encode(&payload).unwrap();
        assert_eq!(token.len(), chars + "gaVoZWxsb6V3b3JsZA".len());
        assert!(token.ends_with("gaVoZWxsb6V3b3JsZA"));
        assert!(token.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_'));
        assert_eq!(codec.decode(&token).unwrap(), payload);
    }
    assert!(matches!(PayloadCodec::new(Config::new().with_checksum_chars(28)), Err(Error::InvalidConfig(_))));
}

#[test]
fn config_from_json() {
    let config: Config = serde_json::from_str(r#"{
        "max_length": 20,
        "checksum_chars": 8,
        "private_salt": "s3cr3t"
    }"#).unwrap();
    let codec = PayloadCodec::new(config).unwrap();
    assert_eq!(codec.config().max_length, Some(20));
    assert_eq!(codec.encode(&Value::from_iter(["hello"])).as_deref(), Ok("blPSXg_HkaVoZWxsbw"));
    assert!(matches!(codec.encode(&Value::from_iter(["hello world"])), Err(Error::TooLong { .. })));
}

#[test]
fn shared_between_threads() {
    let codec = PayloadCodec::new(Config::new().with_private_salt("shared")).unwrap();
    thread::scope(|s| {
        let handles: Vec<_> = (0..8i64).map(|n| {
            let codec = &codec;
            s.spawn(move || {
                let payload = map([("n", n.into()), ("sq", (n * n).into())]);
                for _ in 0..100 {
                    let token = codec.encode(&payload).unwrap();
                    assert_eq!(codec.decode(&token).unwrap(), payload);
                }
                codec.encode(&payload).unwrap()
            })
        }).collect();
        let tokens: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for (n, token) in tokens.iter().enumerate() {
            let payload = map([("n", (n as i64).into()), ("sq", ((n * n) as i64).into())]);
            assert_eq!(token, &codec.encode(&payload).unwrap());
        }
    });
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Thumbnail {
    src: String,
    size: String,
}

#[test]
fn typed_payloads() {
    let codec = PayloadCodec::default();
    let thumbnail = Thumbnail { src: "profile/18374.jpg".into(), size: "160x160".into() };
    let token = codec.encode_from(&thumbnail).unwrap();
    assert_eq!(token, "IfOmgqRzaXplpzE2MHgxNjCjc3JjsXByb2ZpbGUvMTgzNzQuanBn");
    assert_eq!(codec.decode_into::<Thumbnail>(&token).unwrap(), thumbnail);

    let token = codec.encode_from(&["hello"]).unwrap();
    assert_eq!(token, "il-nkaVoZWxsbw");
    assert_eq!(codec.decode_into::<(String,)>(&token).unwrap(), ("hello".to_string(),));

    assert_eq!(codec.encode_from("hello"), Err(Error::UnsupportedType));
    assert!(matches!(codec.decode_into::<Thumbnail>("il-nkaVoZWxsbw"), Err(Error::InvalidPayload(Some(_)))));
}

#[test]
fn payload_errors_carry_the_cause() {
    use std::error::Error as _;
    let codec = PayloadCodec::default();
    let err = codec.decode("W3eTwQ").unwrap_err();
    assert_eq!(err, Error::InvalidPayload(Some(msgpack::de::Error::UnknownTag(0xC1))));
    assert!(err.source().is_some());
    assert!(codec.decode("xTZUwA").unwrap_err().source().is_none());
}
