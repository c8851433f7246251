/*
 * @Author       : 老董
 * @Date         : 2026-02-04
 * @Description  : 基于 ndarray 的 CPU 参考运行时
 *
 * 卷积输出尺寸计算（逐空间维）：
 * out = (in + 2*padding - dilation*(kernel-1) - 1) / stride + 1
 *
 * 1/2/3 阶卷积统一提升为 3 阶计算：缺失的前导空间维视为长度1、核长1。
 */

use ndarray::{Array2, Array5, ArrayD, Dimension, Ix2, Ix5, IxDyn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::cell::RefCell;

use super::{ConvSpec, Layer, LayerSpec, LinearSpec, Runtime};
use crate::nn::NodeError;
use crate::nn::context::Device;
use crate::tensor::Tensor;

pub struct CpuRuntime {
    rng: RefCell<StdRng>,
}

impl CpuRuntime {
    pub fn new() -> Self {
        Self {
            rng: RefCell::new(StdRng::from_entropy()),
        }
    }

    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Kaiming/He 初始化（适用于 ReLU）：N(0, 2/fan_in)
    fn kaiming(&self, fan_in: usize, shape: &[usize]) -> Tensor {
        let std = (2.0 / fan_in as f32).sqrt();
        Tensor::normal_with_rng(0.0, std, shape, &mut *self.rng.borrow_mut())
    }
}

impl Default for CpuRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime for CpuRuntime {
    fn create_layer(&self, spec: &LayerSpec) -> Result<Box<dyn Layer>, NodeError> {
        match *spec {
            LayerSpec::Conv(spec) => {
                let in_per_group = spec.in_channels / spec.groups;
                let mut kernel_shape = vec![spec.out_channels, in_per_group];
                kernel_shape.extend(std::iter::repeat_n(spec.kernel_size, spec.rank));
                let fan_in = in_per_group * spec.kernel_size.pow(spec.rank as u32);
                Ok(Box::new(ConvLayer {
                    spec,
                    kernel: self.kaiming(fan_in, &kernel_shape),
                    bias: spec.bias.then(|| Tensor::zeros(&[spec.out_channels])),
                    device: Device::Cpu,
                }))
            }
            LayerSpec::Linear(spec) => Ok(Box::new(DenseLayer {
                spec,
                weights: self.kaiming(spec.in_features, &[spec.out_features, spec.in_features]),
                bias: spec.bias.then(|| Tensor::zeros(&[spec.out_features])),
                device: Device::Cpu,
            })),
        }
    }

    fn upsample(&self, x: &Tensor, factor: usize) -> Result<Tensor, NodeError> {
        if x.dimension() < 3 {
            return Err(NodeError::ShapeMismatch {
                expected: vec![],
                got: x.shape().to_vec(),
                message: "上采样要求输入形如[batch, channels, 空间维...]".to_string(),
            });
        }
        if factor == 0 {
            return Err(NodeError::config("上采样倍数须大于0"));
        }
        let out_shape: Vec<usize> = x
            .shape()
            .iter()
            .enumerate()
            .map(|(axis, &extent)| if axis >= 2 { extent * factor } else { extent })
            .collect();
        let data = x.data();
        let upsampled = ArrayD::from_shape_fn(IxDyn(&out_shape), |index| {
            let mut source = index.slice().to_vec();
            for axis in source.iter_mut().skip(2) {
                *axis /= factor;
            }
            data[IxDyn(&source)]
        });
        Ok(Tensor::from_array(upsampled))
    }

    fn randn(&self, shape: &[usize]) -> Tensor {
        Tensor::normal_with_rng(0.0, 1.0, shape, &mut *self.rng.borrow_mut())
    }
}

// ==================== 卷积层 ====================

/// N 阶卷积层：核形状 [C_out, C_in/groups, k, ...]，偏置形状 [C_out]
struct ConvLayer {
    spec: ConvSpec,
    kernel: Tensor,
    bias: Option<Tensor>,
    device: Device,
}

impl ConvLayer {
    /// 把 rank 阶的空间形状提升为 3 阶：缺失的前导维补1
    fn lift(&self, spatial: &[usize]) -> [usize; 3] {
        let mut lifted = [1; 3];
        lifted[3 - spatial.len()..].copy_from_slice(spatial);
        lifted
    }

    /// 提升后各维的（核长, 步长, 填充, 膨胀）
    fn lifted_params(&self) -> [(usize, usize, usize, usize); 3] {
        let spec = &self.spec;
        let mut params = [(1, 1, 0, 1); 3];
        for slot in params.iter_mut().skip(3 - spec.rank) {
            *slot = (spec.kernel_size, spec.stride, spec.padding, spec.dilation);
        }
        params
    }
}

fn into_5d(t: &Tensor, shape: [usize; 5]) -> Result<Array5<f32>, NodeError> {
    t.reshape(&shape)?
        .into_array()
        .into_dimensionality::<Ix5>()
        .map_err(|e| NodeError::ShapeMismatch {
            expected: shape.to_vec(),
            got: t.shape().to_vec(),
            message: e.to_string(),
        })
}

impl Layer for ConvLayer {
    fn forward(&self, x: &Tensor) -> Result<Tensor, NodeError> {
        let spec = &self.spec;
        let shape = x.shape();
        if shape.len() != spec.rank + 2 || shape[1] != spec.in_channels {
            return Err(NodeError::ShapeMismatch {
                expected: vec![spec.in_channels],
                got: shape.to_vec(),
                message: format!(
                    "{}阶卷积要求输入形如[batch, {}, 空间维×{}]",
                    spec.rank, spec.in_channels, spec.rank
                ),
            });
        }

        let batch = shape[0];
        let in_extent = self.lift(&shape[2..]);
        let params = self.lifted_params();
        let mut out_extent = [1; 3];
        for axis in 0..3 {
            let (k, s, p, d) = params[axis];
            let padded = in_extent[axis] + 2 * p;
            let receptive = d * (k - 1) + 1;
            if padded < receptive {
                return Err(NodeError::ShapeMismatch {
                    expected: vec![receptive],
                    got: shape.to_vec(),
                    message: "输入空间尺寸小于卷积核的感受野".to_string(),
                });
            }
            out_extent[axis] = (padded - receptive) / s + 1;
        }

        let input = into_5d(
            x,
            [batch, spec.in_channels, in_extent[0], in_extent[1], in_extent[2]],
        )?;
        let in_per_group = spec.in_channels / spec.groups;
        let out_per_group = spec.out_channels / spec.groups;
        let kernel = into_5d(
            &self.kernel,
            [
                spec.out_channels,
                in_per_group,
                params[0].0,
                params[1].0,
                params[2].0,
            ],
        )?;
        let bias = self.bias.as_ref().map(Tensor::to_vec);

        let mut output = Array5::<f32>::zeros((
            batch,
            spec.out_channels,
            out_extent[0],
            out_extent[1],
            out_extent[2],
        ));
        // 输入坐标：out*stride + k*dilation - padding，越界即落在零填充区
        let source = |axis: usize, out: usize, k: usize| -> Option<usize> {
            let (_, s, p, d) = params[axis];
            (out * s + k * d)
                .checked_sub(p)
                .filter(|&i| i < in_extent[axis])
        };
        for ((b, o, z, y, w), value) in output.indexed_iter_mut() {
            let group = o / out_per_group;
            let mut acc = bias.as_ref().map_or(0.0, |bias| bias[o]);
            for ci in 0..in_per_group {
                let c = group * in_per_group + ci;
                for kz in 0..params[0].0 {
                    let Some(iz) = source(0, z, kz) else { continue };
                    for ky in 0..params[1].0 {
                        let Some(iy) = source(1, y, ky) else { continue };
                        for kx in 0..params[2].0 {
                            let Some(ix) = source(2, w, kx) else { continue };
                            acc += input[[b, c, iz, iy, ix]] * kernel[[o, ci, kz, ky, kx]];
                        }
                    }
                }
            }
            *value = acc;
        }

        let mut out_shape = vec![batch, spec.out_channels];
        out_shape.extend_from_slice(&out_extent[3 - spec.rank..]);
        Ok(Tensor::from_array(output.into_dyn()).reshape(&out_shape)?)
    }

    fn named_parameters(&self) -> Vec<(&'static str, &Tensor)> {
        let mut params = vec![("weight", &self.kernel)];
        if let Some(ref bias) = self.bias {
            params.push(("bias", bias));
        }
        params
    }

    fn to_device(&mut self, device: Device) {
        self.device = device;
    }

    fn device(&self) -> Device {
        self.device
    }
}

// ==================== 全连接层 ====================

/// 全连接层：`output = x @ W^T + b`，作用于输入的最后一维；W 形状 [out, in]
struct DenseLayer {
    spec: LinearSpec,
    weights: Tensor,
    bias: Option<Tensor>,
    device: Device,
}

impl Layer for DenseLayer {
    fn forward(&self, x: &Tensor) -> Result<Tensor, NodeError> {
        let spec = &self.spec;
        let shape = x.shape();
        if shape.last() != Some(&spec.in_features) {
            return Err(NodeError::ShapeMismatch {
                expected: vec![spec.in_features],
                got: shape.to_vec(),
                message: "全连接层输入的最后一维须等于in_features".to_string(),
            });
        }

        let rows = x.size() / spec.in_features;
        let to_2d = |t: Tensor, expected: Vec<usize>| -> Result<Array2<f32>, NodeError> {
            t.into_array()
                .into_dimensionality::<Ix2>()
                .map_err(|e| NodeError::ShapeMismatch {
                    expected,
                    got: shape.to_vec(),
                    message: e.to_string(),
                })
        };
        let input = to_2d(x.reshape(&[rows, spec.in_features])?, vec![rows, spec.in_features])?;
        let weights = to_2d(
            self.weights.clone(),
            vec![spec.out_features, spec.in_features],
        )?;

        let mut output = input.dot(&weights.t());
        if let Some(ref bias) = self.bias {
            let bias = ndarray::Array1::from(bias.to_vec());
            output += &bias;
        }

        let mut out_shape = shape[..shape.len() - 1].to_vec();
        out_shape.push(spec.out_features);
        Ok(Tensor::from_array(output.into_dyn()).reshape(&out_shape)?)
    }

    fn named_parameters(&self) -> Vec<(&'static str, &Tensor)> {
        let mut params = vec![("weight", &self.weights)];
        if let Some(ref bias) = self.bias {
            params.push(("bias", bias));
        }
        params
    }

    fn to_device(&mut self, device: Device) {
        self.device = device;
    }

    fn device(&self) -> Device {
        self.device
    }
}
