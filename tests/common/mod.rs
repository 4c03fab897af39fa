#![allow(dead_code)]

use shiftforge::model::{Atom, EntityDef, Peak, PeakDim, Problem};

pub fn atom(id: &str, value: f64, sigma: f64) -> Atom {
    Atom {
        id: id.into(),
        value,
        sigma,
    }
}

pub fn entity(id: &str, atom: &str) -> EntityDef {
    EntityDef {
        id: id.into(),
        atoms: vec![Some(atom.into())],
        prev: None,
        next: None,
    }
}

pub fn peak(id: &str, value: f64, tolerance: f64) -> Peak {
    Peak {
        id: id.into(),
        dims: vec![PeakDim { value, tolerance }],
    }
}

pub fn one_dim(atoms: Vec<Atom>, entities: Vec<EntityDef>, peaks: Vec<Peak>) -> Problem {
    Problem {
        dimensions: vec!["C".into()],
        atoms,
        entities,
        peaks,
        overlap: vec![],
    }
}

/// Two entities, two peaks, each entity compatible with exactly one peak (p ~ 0.9).
pub fn scenario_a() -> Problem {
    one_dim(
        vec![atom("a0", 10.0, 1.0), atom("a1", 30.0, 1.0)],
        vec![entity("e0", "a0"), entity("e1", "a1")],
        vec![peak("p0", 10.125, 0.05), peak("p1", 29.875, 0.05)],
    )
}

/// e1 fits p1 (p ~ 0.62) slightly better than p2 (p ~ 0.55), but e2 can only explain p2
/// badly, so leaving e2 out and giving p2 to e1 scores higher overall.
pub fn scenario_b() -> Problem {
    one_dim(
        vec![
            atom("a0", 10.0, 1.0),
            atom("a1", 50.0, 1.0),
            atom("a2", 48.9, 0.1),
        ],
        vec![entity("e0", "a0"), entity("e1", "a1"), entity("e2", "a2")],
        vec![
            peak("p0", 10.0, 0.1),
            peak("p1", 50.5, 0.1),
            peak("p2", 49.4, 1.0),
        ],
    )
}

/// Two entities, three peaks: one peak has no owner.
pub fn scenario_c() -> Problem {
    one_dim(
        vec![atom("a0", 10.0, 1.0), atom("a1", 20.0, 1.0)],
        vec![entity("e0", "a0"), entity("e1", "a1")],
        vec![
            peak("p0", 10.1, 0.1),
            peak("p1", 19.9, 0.1),
            peak("p2", 90.0, 0.1),
        ],
    )
}

/// Linear chain of `n` residues with H/N/CA and the previous CA, one peak per residue
/// plus `extra` decoys.
pub fn chain(n: usize, extra: usize) -> Problem {
    let dimensions = vec!["H".into(), "N".into(), "CA".into(), "CA_prev".into()];
    let mut atoms = Vec::new();
    let mut entities = Vec::new();
    let mut peaks = Vec::new();

    let shift = |i: usize, base: f64, step: f64| base + ((i * 7919) % 13) as f64 * step;

    for i in 0..n {
        let r = format!("r{}", i);
        atoms.push(atom(&format!("{}.H", r), shift(i, 7.6, 0.1), 0.3));
        atoms.push(atom(&format!("{}.N", r), shift(i, 112.0, 1.0), 2.0));
        atoms.push(atom(&format!("{}.CA", r), shift(i, 50.0, 0.9), 1.0));

        entities.push(EntityDef {
            id: r.clone(),
            atoms: vec![
                Some(format!("{}.H", r)),
                Some(format!("{}.N", r)),
                Some(format!("{}.CA", r)),
                (i > 0).then(|| format!("r{}.CA", i - 1)),
            ],
            prev: (i > 0).then(|| format!("r{}", i - 1)),
            next: (i + 1 < n).then(|| format!("r{}", i + 1)),
        });
    }

    for i in 0..n + extra {
        let j = i % n;
        let jitter = if i >= n { 0.35 } else { 0.05 };
        let prev_ca = if j > 0 {
            shift(j - 1, 50.0, 0.9) + jitter
        } else {
            -9999.0
        };
        peaks.push(Peak {
            id: format!("pk{}", i),
            dims: vec![
                PeakDim {
                    value: shift(j, 7.6, 0.1) + jitter * 0.1,
                    tolerance: 0.02,
                },
                PeakDim {
                    value: shift(j, 112.0, 1.0) + jitter,
                    tolerance: 0.2,
                },
                PeakDim {
                    value: shift(j, 50.0, 0.9) + jitter,
                    tolerance: 0.1,
                },
                PeakDim {
                    value: prev_ca,
                    tolerance: 0.1,
                },
            ],
        });
    }

    Problem {
        dimensions,
        atoms,
        entities,
        peaks,
        overlap: vec![(3, 2)],
    }
}
