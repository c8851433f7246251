use crate::errors::TensorError;
use crate::tensor::Tensor;

#[test]
fn test_compare_shapes() {
    let tensor1 = Tensor::new(&[1., 2., 3., 4.], &[1, 4]);
    let tensor2 = Tensor::new(&[1., 2., 3., 4.], &[1, 4]);
    assert!(tensor1.is_same_shape(&tensor2));

    let tensor3 = Tensor::new(&[1., 2., 3., 4.], &[4, 1]);
    assert!(!tensor1.is_same_shape(&tensor3));
}

#[test]
fn test_reshape() {
    let tensor = Tensor::new(&[1., 2., 3., 4., 5., 6.], &[2, 3]);
    let reshaped = tensor.reshape(&[3, 2]).unwrap();
    assert_eq!(reshaped.shape(), &[3, 2]);
    assert_eq!(reshaped.to_vec(), tensor.to_vec());
}

#[test]
fn test_reshape_incompatible() {
    let tensor = Tensor::new(&[1., 2., 3., 4.], &[2, 2]);
    assert_eq!(
        tensor.reshape(&[3]),
        Err(TensorError::IncompatibleShape {
            from: vec![2, 2],
            to: vec![3],
        })
    );
}

#[test]
fn test_flatten_batch() {
    let tensor = Tensor::zeros(&[4, 3, 8, 8]);
    assert_eq!(tensor.flatten_batch().unwrap().shape(), &[4, 192]);

    let tensor = Tensor::zeros(&[5]);
    assert_eq!(tensor.flatten_batch().unwrap().shape(), &[5, 1]);

    let scalar = Tensor::new(&[1.], &[]);
    assert_eq!(
        scalar.flatten_batch(),
        Err(TensorError::RankTooLow { min: 1, got: 0 })
    );
}

#[test]
fn test_map() {
    let tensor = Tensor::new(&[-1., 0., 2.], &[3]);
    assert_eq!(tensor.map(|v| v * 2.).to_vec(), vec![-2., 0., 4.]);
}
