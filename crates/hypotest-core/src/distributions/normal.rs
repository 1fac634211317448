// =============================================================================
// Standard Normal Distribution
// =============================================================================
//
// The z tests (one and two proportions) and the z critical values all go
// through these three functions.
//
//   normal_cdf      Abramowitz & Stegun 26.2.17, |error| < 7.5e-8
//   normal_inv_cdf  Acklam / Beasley-Springer-Moro rational approximation
//                   with three regions split at p = 0.02425 and 0.97575
//
// =============================================================================

use std::f64::consts::PI;

/// Beyond |x| >= 8 the CDF is 0 or 1 to double precision.
const CDF_SATURATION: f64 = 8.0;

// A&S 26.2.17 coefficients
const AS_P: f64 = 0.231_641_9;
const AS_B: [f64; 5] = [
    0.319_381_530,
    -0.356_563_782,
    1.781_477_937,
    -1.821_255_978,
    1.330_274_429,
];

// Rational approximation coefficients for the inverse CDF
const INV_A: [f64; 6] = [
    -3.969_683_028_665_376e1,
    2.209_460_984_245_205e2,
    -2.759_285_104_469_687e2,
    1.383_577_518_672_690e2,
    -3.066_479_806_614_716e1,
    2.506_628_277_459_239,
];
const INV_B: [f64; 5] = [
    -5.447_609_879_822_406e1,
    1.615_858_368_580_409e2,
    -1.556_989_798_598_866e2,
    6.680_131_188_771_972e1,
    -1.328_068_155_288_572e1,
];
const INV_C: [f64; 6] = [
    -7.784_894_002_430_293e-3,
    -3.223_964_580_411_365e-1,
    -2.400_758_277_161_838,
    -2.549_732_539_343_734,
    4.374_664_141_464_968,
    2.938_163_982_698_783,
];
const INV_D: [f64; 4] = [
    7.784_695_709_041_462e-3,
    3.224_671_290_700_398e-1,
    2.445_134_137_142_996,
    3.754_408_661_907_416,
];

/// Split between the tail and central regions of the inverse CDF.
const INV_P_LOW: f64 = 0.024_25;

/// Standard normal density φ(x).
pub fn normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Standard normal CDF Φ(x).
///
/// Exactly 0 for x <= −8 and exactly 1 for x >= 8.
pub fn normal_cdf(x: f64) -> f64 {
    if x >= CDF_SATURATION {
        return 1.0;
    }
    if x <= -CDF_SATURATION {
        return 0.0;
    }

    let z = x.abs();
    let t = 1.0 / (1.0 + AS_P * z);
    let poly = t * (AS_B[0] + t * (AS_B[1] + t * (AS_B[2] + t * (AS_B[3] + t * AS_B[4]))));
    let upper = normal_pdf(z) * poly;

    if x < 0.0 {
        upper
    } else {
        1.0 - upper
    }
}

/// Inverse of the standard normal CDF (the quantile function).
///
/// Returns −∞ for p <= 0, +∞ for p >= 1 and exactly 0 at p = 0.5.
pub fn normal_inv_cdf(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    if p == 0.5 {
        return 0.0;
    }

    if p < INV_P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        tail_ratio(q)
    } else if p <= 1.0 - INV_P_LOW {
        let q = p - 0.5;
        let r = q * q;
        let num = ((((INV_A[0] * r + INV_A[1]) * r + INV_A[2]) * r + INV_A[3]) * r + INV_A[4]) * r
            + INV_A[5];
        let den = ((((INV_B[0] * r + INV_B[1]) * r + INV_B[2]) * r + INV_B[3]) * r + INV_B[4]) * r
            + 1.0;
        num * q / den
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -tail_ratio(q)
    }
}

/// Lower-tail rational function shared by both tails.
fn tail_ratio(q: f64) -> f64 {
    let num = ((((INV_C[0] * q + INV_C[1]) * q + INV_C[2]) * q + INV_C[3]) * q + INV_C[4]) * q
        + INV_C[5];
    let den = (((INV_D[0] * q + INV_D[1]) * q + INV_D[2]) * q + INV_D[3]) * q + 1.0;
    num / den
}
