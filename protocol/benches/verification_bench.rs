// Verification benchmarks for the sidechain protocol.
//
// Covers program hash derivation, signature verification over growing
// program counts, the deposit guard against sled, and side aux-pow
// generation.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use sidechain_protocol::auxpow::{generate_side_aux_pow, FabricatedAuxPowGenerator};
use sidechain_protocol::config::OP_CHECKSIG;
use sidechain_protocol::crosschain::check_cross_chain_transaction;
use sidechain_protocol::spv::{MerkleProof, SpvError, SpvVerifier};
use sidechain_protocol::storage::{ChainDB, MemoryReferenceStore};
use sidechain_protocol::transaction::payload::{PayloadCoinBase, PayloadRechargeToSideChain};
use sidechain_protocol::transaction::{
    verify_signature, Hash256, OutPoint, Output, Payload, Program, ProgramHash, Transaction,
    TransactionBuilder,
};
use sidechain_protocol::vm::{ExecutionContext, ExecutionOutcome, ScriptEngine};

struct AcceptAll;

impl ScriptEngine for AcceptAll {
    fn execute(&self, _: &[u8], _: &[u8], _: &ExecutionContext<'_>) -> ExecutionOutcome {
        ExecutionOutcome::success()
    }
}

impl SpvVerifier for AcceptAll {
    fn verify(&self, _: &MerkleProof, _: &Transaction) -> Result<(), SpvError> {
        Ok(())
    }
}

fn redeem_script(i: u32) -> Vec<u8> {
    let mut code = vec![0x21];
    code.extend_from_slice(&i.to_le_bytes());
    code.extend_from_slice(&[0x02; 29]);
    code.push(OP_CHECKSIG);
    code
}

/// A spend of `n` distinct owners with programs attached in reverse order.
fn spend(n: u32) -> (MemoryReferenceStore, Transaction) {
    let mut funding = TransactionBuilder::new(Payload::TransferAsset);
    for i in 0..n {
        funding = funding.output(Output {
            asset_id: Hash256::ZERO,
            value: 1,
            output_lock: 0,
            program_hash: ProgramHash::from_code(&redeem_script(i)).unwrap(),
        });
    }
    let funding = funding.build();
    let funding_hash = funding.hash();
    let store = MemoryReferenceStore::new();
    store.insert(funding);

    let mut builder = TransactionBuilder::new(Payload::TransferAsset);
    for i in 0..n {
        builder = builder.input(OutPoint::new(funding_hash, i as u16), 0);
    }
    for i in (0..n).rev() {
        builder = builder.program(Program::new(redeem_script(i), vec![0u8; 64]));
    }
    (store, builder.build())
}

fn bench_program_hash(c: &mut Criterion) {
    let code = redeem_script(7);
    c.bench_function("program_hash/from_code", |b| {
        b.iter(|| ProgramHash::from_code(&code).unwrap());
    });
}

fn bench_verify_signature(c: &mut Criterion) {
    let mut group = c.benchmark_group("verify_signature/programs");

    for size in [1u32, 8, 64, 512] {
        let (store, tx) = spend(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &tx, |b, tx| {
            b.iter(|| verify_signature(tx, &store, &AcceptAll, &AcceptAll).unwrap());
        });
    }

    group.finish();
}

fn bench_deposit_guard(c: &mut Criterion) {
    let db = ChainDB::open_temporary().unwrap();
    let mut nonce: u64 = 0;

    c.bench_function("deposit_guard/sled_insert", |b| {
        b.iter(|| {
            nonce += 1;
            let main = TransactionBuilder::new(Payload::CoinBase(PayloadCoinBase {
                coinbase_data: nonce.to_le_bytes().to_vec(),
            }))
            .build();
            let tx = TransactionBuilder::new(Payload::RechargeToSideChain(
                PayloadRechargeToSideChain {
                    merkle_proof: vec![],
                    main_chain_transaction: main.to_bytes().unwrap(),
                },
            ))
            .build();
            check_cross_chain_transaction(&tx, &db).unwrap();
        });
    });
}

fn bench_side_aux_pow(c: &mut Criterion) {
    c.bench_function("auxpow/generate_side_aux_pow", |b| {
        b.iter(|| {
            generate_side_aux_pow(
                Hash256([0x11; 32]),
                Hash256([0x22; 32]),
                &FabricatedAuxPowGenerator,
            )
            .unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_program_hash,
    bench_verify_signature,
    bench_deposit_guard,
    bench_side_aux_pow,
);
criterion_main!(benches);
