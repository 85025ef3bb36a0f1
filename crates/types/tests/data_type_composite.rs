//! Arrays, rows, and large-object indirection.

use silica_types::lob::{LobRequest, LobResponse, LobTransport, RemoteLobStore};
use silica_types::types::collation::Collation;
use silica_types::types::registry;
use silica_types::{
    Error, LobStore, LocalSession, MemoryLobStore, SessionContext, SqlType, Value, scan_value,
};

fn int_array(cardinality: u32) -> SqlType {
    SqlType::Array {
        element: Box::new(SqlType::Integer),
        cardinality,
    }
}

#[test]
fn test_array_cardinality_boundary() {
    let session = LocalSession::new();
    let ty = int_array(10);
    let ten = Value::Array((0..10).map(Value::Integer).collect());
    assert!(ty.convert_to_type_limits(&session, &ten).is_ok());

    let eleven = Value::Array((0..11).map(Value::Integer).collect());
    let err = ty.convert_to_type_limits(&session, &eleven).unwrap_err();
    assert!(matches!(err, Error::CardinalityViolation { .. }));
}

#[test]
fn test_nested_row_conversion() {
    let session = LocalSession::new();
    let source = SqlType::Row {
        fields: vec![SqlType::Integer, int_array(4)],
    };
    let target = SqlType::Row {
        fields: vec![
            SqlType::BigInt,
            SqlType::Array {
                element: Box::new(SqlType::Numeric {
                    precision: 10,
                    scale: 0,
                }),
                cardinality: 4,
            },
        ],
    };
    let v = Value::Row(vec![
        Value::Integer(7),
        Value::Array(vec![Value::Integer(1), Value::Null]),
    ]);
    let converted = target.convert_to_type(&session, &v, &source).unwrap();
    match converted {
        Value::Row(fields) => {
            assert_eq!(fields[0], Value::BigInt(7));
            match &fields[1] {
                Value::Array(items) => {
                    assert!(matches!(items[0], Value::Numeric(_)));
                    assert_eq!(items[1], Value::Null);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_array_literal_round_trip() {
    let session = LocalSession::new();
    let ty = SqlType::Array {
        element: Box::new(SqlType::Varchar {
            length: 16,
            collation: Collation::DEFAULT,
        }),
        cardinality: 8,
    };
    let v = scan_value(&session, "ARRAY['a', 'b, c', NULL]", &ty).unwrap();
    let text = ty.convert_to_string(&session, &v).unwrap();
    assert_eq!(text, "ARRAY['a', 'b, c', NULL]");
    assert_eq!(scan_value(&session, &text, &ty).unwrap(), v);
}

#[test]
fn test_clob_values_live_in_the_store() {
    let session = LocalSession::new();
    let clob_ty = SqlType::Clob {
        length: registry::DEFAULT_LOB_LENGTH,
        collation: Collation::DEFAULT,
    };
    let stored = clob_ty
        .convert_to_type(
            &session,
            &Value::String("large text body".into()),
            &SqlType::VARCHAR,
        )
        .unwrap();
    let locator = match &stored {
        Value::Clob(locator) => locator,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(session.lobs().clob_length(locator.id).unwrap(), 15);

    // Reading back through a character conversion materializes the text.
    let back = SqlType::VARCHAR
        .convert_to_type(&session, &stored, &clob_ty)
        .unwrap();
    assert_eq!(back, Value::String("large text body".into()));
}

/// Transport that answers from a local store, standing in for a server.
struct Loopback {
    store: MemoryLobStore,
}

impl LobTransport for Loopback {
    fn call(&self, request: LobRequest) -> silica_types::Result<LobResponse> {
        self.store.serve(request)
    }
}

#[test]
fn test_remote_store_matches_local_behavior() {
    let remote = RemoteLobStore::new(Loopback {
        store: MemoryLobStore::new(),
    });
    let id = remote.create_blob(0).unwrap();
    remote.write_bytes(id, 0, &[1, 2, 3, 4, 5]).unwrap();
    assert_eq!(remote.blob_length(id).unwrap(), 5);
    assert_eq!(remote.read_bytes(id, 1, 3).unwrap(), vec![2, 3, 4]);
    assert_eq!(remote.position_bytes(id, &[3, 4], 1).unwrap(), Some(2));

    let copy = remote.duplicate_blob(id).unwrap();
    remote.truncate_blob(copy, 2).unwrap();
    assert_eq!(remote.blob_length(copy).unwrap(), 2);
    assert_eq!(remote.blob_length(id).unwrap(), 5);
}
