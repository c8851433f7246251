use crate::errors::TensorError;
use crate::tensor::Tensor;
use ndarray::Array;
use ndarray::IxDyn;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn test_new_scalar() {
    let tensor = Tensor::new(&[1.], &[]);
    assert_eq!(tensor.shape(), &[] as &[usize]);
    assert_eq!(
        tensor.data,
        Array::from_shape_vec(IxDyn(&[]), vec![1.]).unwrap()
    );

    let tensor = Tensor::new(&[1.], &[1, 1, 1]);
    assert_eq!(tensor.shape(), &[1, 1, 1]);
    assert_eq!(tensor.size(), 1);
}

#[test]
#[should_panic]
fn test_new_invalid_scalar() {
    let _ = Tensor::new(&[1., 2.], &[1, 1, 1]);
}

#[test]
fn test_try_new_reports_mismatch() {
    let result = Tensor::try_new(&[1., 2., 3.], &[2, 2]);
    assert_eq!(
        result,
        Err(TensorError::DataShapeMismatch {
            data_len: 3,
            shape: vec![2, 2],
        })
    );
}

#[test]
fn test_new_matrix() {
    let tensor = Tensor::new(&[1., 2., 3., 4., 5., 6.], &[2, 3]);
    assert_eq!(tensor.shape(), &[2, 3]);
    assert_eq!(tensor.dimension(), 2);
    assert_eq!(tensor.to_vec(), vec![1., 2., 3., 4., 5., 6.]);
}

#[test]
fn test_zeros_and_ones() {
    let zeros = Tensor::zeros(&[2, 3]);
    assert!(zeros.to_vec().iter().all(|&v| v == 0.));
    let ones = Tensor::ones(&[4]);
    assert_eq!(ones.to_vec(), vec![1.; 4]);
}

#[test]
fn test_normal_with_seeded_rng() {
    let a = Tensor::normal_with_rng(0., 1., &[3, 5], &mut StdRng::seed_from_u64(7));
    let b = Tensor::normal_with_rng(0., 1., &[3, 5], &mut StdRng::seed_from_u64(7));
    assert_eq!(a, b);
    assert_eq!(a.shape(), &[3, 5]);
    assert!(a.to_vec().iter().all(|v| v.is_finite()));
}

#[test]
fn test_normal_statistics() {
    let t = Tensor::normal_with_rng(2., 0.5, &[10_000], &mut StdRng::seed_from_u64(0));
    let data = t.to_vec();
    let mean = data.iter().sum::<f32>() / data.len() as f32;
    let var = data.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / data.len() as f32;
    assert!((mean - 2.).abs() < 0.05, "均值偏差过大：{mean}");
    assert!((var.sqrt() - 0.5).abs() < 0.05, "标准差偏差过大：{}", var.sqrt());
}
