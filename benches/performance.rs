use criterion::*;

use quvec::math::{C, C_ONE, C_ZERO};
use quvec::pauli::Pauli;
use quvec::prelude::*;

fn zero_state(qubit_count: u32) -> Vec<C> {
    let mut state = vec![C_ZERO; 1 << qubit_count];
    state[0] = C_ONE;
    state
}

fn hadamard_layer(c: &mut Criterion) {
    let ctx = ExecCtx::new();
    for qu_num in [16u32, 18, 20] {
        let mut state = zero_state(qu_num);
        c.bench_function(format!("h_layer_qu{}", qu_num).as_str(), |b| {
            b.iter(|| {
                for qubit in 0..qu_num as usize {
                    h_gate(black_box(qubit), &mut state, &ctx).unwrap();
                }
            })
        });
    }
}

fn pauli_string(c: &mut Criterion) {
    let ctx = ExecCtx::new();
    for qu_num in [16u32, 18, 20] {
        let mut state = zero_state(qu_num);
        for qubit in 0..qu_num as usize {
            h_gate(qubit, &mut state, &ctx).unwrap();
        }
        let ops: Vec<Pauli> = (0..qu_num)
            .map(|qubit| match qubit % 4 {
                0 => Pauli::X,
                1 => Pauli::Y,
                2 => Pauli::Z,
                _ => Pauli::I,
            })
            .collect();
        c.bench_function(format!("pauli_string_qu{}", qu_num).as_str(), |b| {
            b.iter(|| expval::multi_qubit_pauli_whole(black_box(&ops), &state, &ctx).unwrap())
        });
    }
}

criterion_group!(benches, hadamard_layer, pauli_string);
criterion_main!(benches);
