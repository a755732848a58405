use candle_core::{Device, Tensor, DType};
use medkb_embed::masked_mean_l2;

#[test]
fn masked_mean_l2_ignores_padding() {
    let dev = Device::Cpu;
    // Two tokens with hidden dim 4; second token is padding.
    let h = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0,
                                 5.0, 6.0, 7.0, 8.0],
                               (1, 2, 4), &dev).unwrap();
    let mask = Tensor::from_slice(&[1u32, 0u32], (1, 2), &dev).unwrap();
    let out = masked_mean_l2(&h, &mask).unwrap();
    let v: Vec<Vec<f32>> = out.to_vec2().unwrap();
    let norm: f32 = 30.0f32.sqrt();
    let expected = [1.0 / norm, 2.0 / norm, 3.0 / norm, 4.0 / norm];
    for (a, b) in v[0].iter().cloned().zip(expected) {
        assert!((a - b).abs() < 1e-5, "a={} b={}", a, b);
    }
}

#[test]
fn masked_mean_l2_averages_unmasked_tokens() {
    let dev = Device::Cpu;
    let h = Tensor::from_slice(&[1.0f32, 0.0, 3.0, 0.0], (1, 2, 2), &dev).unwrap();
    let mask = Tensor::from_slice(&[1i64, 1i64], (1, 2), &dev).unwrap().to_dtype(DType::F32).unwrap();
    let v: Vec<Vec<f32>> = masked_mean_l2(&h, &mask).unwrap().to_vec2().unwrap();
    // mean = [2, 0] -> normalized [1, 0]
    assert!((v[0][0] - 1.0).abs() < 1e-5);
    assert!(v[0][1].abs() < 1e-5);
}

#[test]
fn rejects_non_3d_hidden_states() {
    let dev = Device::Cpu;
    let h = Tensor::zeros((2, 4), DType::F32, &dev).unwrap();
    let mask = Tensor::ones((2, 4), DType::F32, &dev).unwrap();
    assert!(masked_mean_l2(&h, &mask).is_err());
}
