//! End-to-end behaviour through the public API.

use std::sync::Arc;

use fpe::{
    AlphanumericCipher, FieldCatalog, FieldConfig, FormatPattern, Key, NumericCipher, Record,
    RoundStrategy, Table, TransformOptions, Transformer, DEFAULT_ROUNDS,
};

fn key(bytes: &[u8]) -> Key {
    Key::from_bytes(bytes.to_vec()).unwrap()
}

#[test]
fn ssn_keeps_dashes_and_round_trips() {
    let mut catalog = FieldCatalog::new();
    catalog.insert("ssn", FieldConfig::numeric(Some("999-99-9999"), None));
    let options = TransformOptions {
        validate: true,
        ..TransformOptions::default()
    };
    let engine = Transformer::new(&key(b"scenario-one-key"), Arc::new(catalog), options).unwrap();
    let config = engine.catalog().classify("ssn").clone();

    let enc = engine.encrypt_value(&config, "123-45-6789").unwrap();
    assert_eq!(enc.len(), 11);
    assert_eq!(enc.find('-'), Some(3));
    assert_eq!(enc.rfind('-'), Some(6));
    assert_eq!(enc.bytes().filter(u8::is_ascii_digit).count(), 9);
    assert!(FormatPattern::parse("999-99-9999").unwrap().matches(&enc));
    assert_eq!(engine.decrypt_value(&config, &enc).unwrap(), "123-45-6789");
}

#[test]
fn customer_id_keeps_character_classes() {
    let cipher = AlphanumericCipher::new(&key(b"scenario-two-key")).unwrap();
    let enc = cipher.encrypt("CUST12345");
    assert_eq!(enc.len(), 9);
    assert!(enc[..4].bytes().all(|b| b.is_ascii_uppercase()));
    assert!(enc[4..].bytes().all(|b| b.is_ascii_digit()));
}

#[test]
fn single_digit_unchanged() {
    let cipher = NumericCipher::new(&key(b"k"), DEFAULT_ROUNDS, RoundStrategy::Modular).unwrap();
    assert_eq!(cipher.encrypt("7").unwrap(), "7");
}

#[test]
fn wrong_key_yields_same_shape_different_value() {
    let x = "123-45-6789";
    let modular = RoundStrategy::Modular;
    let right = NumericCipher::new(&key(b"right key bytes!"), DEFAULT_ROUNDS, modular).unwrap();
    let wrong = NumericCipher::new(&key(b"wrong key bytes!"), DEFAULT_ROUNDS, modular).unwrap();

    let out = wrong.decrypt(&right.encrypt(x).unwrap()).unwrap();
    assert_ne!(out, x);
    assert!(FormatPattern::parse("999-99-9999").unwrap().matches(&out));

    let right = AlphanumericCipher::new(&key(b"right key bytes!")).unwrap();
    let wrong = AlphanumericCipher::new(&key(b"wrong key bytes!")).unwrap();
    let out = wrong.decrypt(&right.encrypt("john.doe@example.com"));
    assert_ne!(out, "john.doe@example.com");
    assert_eq!(out.len(), 20);
    assert_eq!(out.find('@'), Some(8));
}

#[test]
fn mixed_catalog_only_changes_ssn_column() {
    let mut catalog = FieldCatalog::new();
    catalog.insert("ssn", FieldConfig::numeric(Some("999-99-9999"), None));
    let engine = Transformer::new(
        &key(b"scenario-five-key"),
        Arc::new(catalog),
        TransformOptions::default(),
    )
    .unwrap();

    let rows = [
        ("123-45-6789", "John Doe"),
        ("987-65-4321", "Jane Smith"),
        ("456-78-9123", "Bob Johnson"),
    ];
    let records: Vec<Record> = rows
        .iter()
        .map(|(ssn, name)| {
            Record::from([
                ("ssn".to_owned(), Some((*ssn).to_owned())),
                ("name".to_owned(), Some((*name).to_owned())),
            ])
        })
        .collect();

    let enc = engine.encrypt_records(&records).unwrap();
    assert!(enc.report.is_clean());
    for (before, after) in records.iter().zip(&enc.output) {
        assert_eq!(before["name"], after["name"]);
        assert_ne!(before["ssn"], after["ssn"]);
    }

    let table = Table {
        columns: vec!["ssn".into(), "name".into()],
        rows: rows
            .iter()
            .map(|(ssn, name)| vec![Some((*ssn).to_owned()), Some((*name).to_owned())])
            .collect(),
    };
    let enc_table = engine.encrypt_table(&table).unwrap().output;
    for (i, row) in enc_table.rows.iter().enumerate() {
        // Records and tables agree cell for cell.
        assert_eq!(row[0], enc.output[i]["ssn"]);
        assert_eq!(row[1], table.rows[i][1]);
    }
    assert_eq!(engine.decrypt_table(&enc_table).unwrap().output, table);
}

#[test]
fn engine_is_usable_from_many_threads() {
    let engine = Arc::new(
        Transformer::new(
            &key(b"0123456789abcdef"),
            Arc::new(FieldCatalog::builtin()),
            TransformOptions::default(),
        )
        .unwrap(),
    );
    let config = engine.catalog().classify("credit_card").clone();
    let expected = engine.encrypt_value(&config, "4111-1111-1111-1111").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let config = config.clone();
            std::thread::spawn(move || {
                engine
                    .encrypt_value(&config, "4111-1111-1111-1111")
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn csv_dataset_round_trips_through_table() {
    let dataset = concat!(
        "customer_id,name,ssn,credit_card,email,phone,account_number,address\n",
        "CUST12345,John Doe,123-45-6789,4111-1111-1111-1111,john@example.com,",
        "(555) 123-4567,12345678,123 Main St\n",
        "CUST67890,Jane Smith,987-65-4321,5500-0000-0000-0004,,",
        "(555) 987-6543,87654321,456 Oak Ave\n",
    );
    let engine = Transformer::new(
        &key(b"0123456789abcdef"),
        Arc::new(FieldCatalog::builtin()),
        TransformOptions::default(),
    )
    .unwrap();

    let table = Table::from_csv_reader(dataset.as_bytes()).unwrap();
    let enc = engine.encrypt_table(&table).unwrap();
    assert!(enc.report.is_clean());

    let mut encrypted_csv = Vec::new();
    enc.output.to_csv_writer(&mut encrypted_csv).unwrap();
    let reread = Table::from_csv_reader(encrypted_csv.as_slice()).unwrap();
    assert_eq!(reread, enc.output);
    assert_eq!(reread.rows[1][4], None);
    assert_eq!(reread.rows[0][1].as_deref(), Some("John Doe"));
    assert!(FormatPattern::parse("(999) 999-9999")
        .unwrap()
        .matches(reread.rows[0][5].as_deref().unwrap()));

    let dec = engine.decrypt_table(&reread).unwrap();
    let mut decrypted_csv = Vec::new();
    dec.output.to_csv_writer(&mut decrypted_csv).unwrap();
    assert_eq!(String::from_utf8(decrypted_csv).unwrap(), dataset);
}
