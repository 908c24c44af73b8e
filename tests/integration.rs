//! End-to-end runs through the public API: plant a key, build the index,
//! let the coordinator drive a worker to the hit, and check the emitted
//! material decodes back to the key.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use k256::Scalar;

use vanityhunt::address;
use vanityhunt::coordinator::Coordinator;
use vanityhunt::crypto;
use vanityhunt::engine::{SearchContext, SearchMode, CPU_GRP_SIZE};
use vanityhunt::index::PrefixIndex;
use vanityhunt::math::Point;
use vanityhunt::output::OutputSink;

fn compressed_p2pkh(k: &Scalar) -> String {
    let p = Point::from_scalar(k);
    address::p2pkh_address(&crypto::hash160_compressed(&p.x.to_bytes(), p.y.is_odd()))
}

#[test]
fn coordinator_finds_planted_address_and_stops() {
    let secret = Scalar::from(0xDEAD_BEEFu64);
    let target = compressed_p2pkh(&secret);

    // plant the secret 100 scalars above the worker's starting key, well
    // inside the first window
    let start = secret + (-Scalar::from(100u64));
    let index = PrefixIndex::build(&[target]).unwrap();
    let ctx = Arc::new(SearchContext::new(
        index,
        SearchMode::Both,
        true,
        0,
        start,
        OutputSink::new(None),
        CPU_GRP_SIZE,
    ));

    Coordinator::new(Arc::clone(&ctx)).run(1, &[], &[]);

    assert_eq!(ctx.found_count.load(Ordering::Relaxed), 1);
    assert!(ctx.search_over());
    assert!(ctx.index.all_found());
}

#[test]
fn emitted_record_lands_in_the_output_file() {
    let secret = Scalar::from(0x5EED_1234u64);
    let target = compressed_p2pkh(&secret);

    let path = std::env::temp_dir().join(format!("vanityhunt-it-{}.txt", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let start = secret + (-Scalar::from(10u64));
    let index = PrefixIndex::build(&[target.clone()]).unwrap();
    let ctx = Arc::new(SearchContext::new(
        index,
        SearchMode::Compressed,
        true,
        0,
        start,
        OutputSink::new(Some(path.to_str().unwrap().to_string())),
        CPU_GRP_SIZE,
    ));

    Coordinator::new(Arc::clone(&ctx)).run(1, &[], &[]);

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains(&format!("Pub Addr: {}", target)));
    assert!(contents.contains("Priv (WIF): "));
    assert!(contents.contains("Priv (HEX): 0x"));

    // the WIF must decode back to the planted key
    let wif = contents
        .lines()
        .find_map(|l| l.strip_prefix("Priv (WIF): "))
        .unwrap()
        .to_string();
    let decoded = address::decode_base58(&wif).unwrap();
    assert_eq!(decoded.len(), 38);
    assert_eq!(decoded[0], 0x80);
    assert_eq!(decoded[33], 0x01);
    assert_eq!(
        &decoded[34..38],
        &crypto::checksum4(&decoded[..34]),
        "WIF checksum mismatch"
    );
    let key_bytes = vanityhunt::math::scalar_to_bytes(&secret);
    assert_eq!(&decoded[1..33], &key_bytes);

    let _ = std::fs::remove_file(&path);
}
