// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Sentence pooling over token embeddings.
//!
//! Token-level model output has shape `[seq_len, hidden_dim]` per input.
//! Pooling reduces it to one `hidden_dim` vector; padding tokens are
//! excluded through the attention mask.

use clap::ValueEnum;
use ndarray::{ArrayView2, ArrayViewD, Axis, Ix2};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::embeddings::EmbeddingError;

/// How token embeddings are reduced to a sentence embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PoolingStrategy {
    /// First token ([CLS] / `<s>`), used by BGE models
    Cls,
    /// Attention-mask weighted mean, used by sentence-transformers MiniLM
    Mean,
}

impl fmt::Display for PoolingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolingStrategy::Cls => write!(f, "cls"),
            PoolingStrategy::Mean => write!(f, "mean"),
        }
    }
}

/// Pools one item's token embeddings `[seq_len, hidden_dim]`
pub fn pool(strategy: PoolingStrategy, tokens: ArrayView2<'_, f32>, mask: &[i64]) -> Vec<f32> {
    match strategy {
        PoolingStrategy::Cls => cls_pool(tokens),
        PoolingStrategy::Mean => mean_pool(tokens, mask),
    }
}

fn cls_pool(tokens: ArrayView2<'_, f32>) -> Vec<f32> {
    if tokens.nrows() == 0 {
        return vec![0.0; tokens.ncols()];
    }
    tokens.row(0).to_vec()
}

fn mean_pool(tokens: ArrayView2<'_, f32>, mask: &[i64]) -> Vec<f32> {
    let hidden_dim = tokens.ncols();
    let mut pooled = vec![0.0f32; hidden_dim];
    let mut sum_mask = 0.0f32;

    for (i, row) in tokens.rows().into_iter().enumerate() {
        let mask_value = mask.get(i).copied().unwrap_or(0) as f32;
        if mask_value == 0.0 {
            continue;
        }
        sum_mask += mask_value;
        for (acc, value) in pooled.iter_mut().zip(row.iter()) {
            *acc += value * mask_value;
        }
    }

    for val in &mut pooled {
        *val /= sum_mask.max(1e-9);
    }

    pooled
}

/// Pools a whole model output into one vector per batch item.
///
/// `mask` is the flattened `[batch, seq_len]` attention mask fed to the model.
/// Rank-3 output `[batch, seq_len, hidden]` is pooled with `strategy`; rank-2
/// output `[batch, hidden]` is already sentence-level and is returned as is.
pub fn pool_batch(
    strategy: PoolingStrategy,
    output: ArrayViewD<'_, f32>,
    mask: &[i64],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let shape = output.shape().to_vec();
    if shape.first().copied() != Some(batch_size) {
        return Err(EmbeddingError::UnexpectedOutput(format!(
            "output shape {:?} does not match batch of {}",
            shape, batch_size
        )));
    }

    match shape.len() {
        3 => {
            let seq_len = shape[1];
            if mask.len() != batch_size * seq_len {
                return Err(EmbeddingError::UnexpectedOutput(format!(
                    "attention mask of {} entries does not cover output shape {:?}",
                    mask.len(),
                    shape
                )));
            }
            (0..batch_size)
                .map(|b| -> Result<Vec<f32>, EmbeddingError> {
                    let item = output.index_axis(Axis(0), b).into_dimensionality::<Ix2>()?;
                    let item_mask = &mask[b * seq_len..(b + 1) * seq_len];
                    Ok(pool(strategy, item, item_mask))
                })
                .collect()
        }
        2 => Ok(output
            .outer_iter()
            .map(|row| row.iter().copied().collect())
            .collect()),
        _ => Err(EmbeddingError::UnexpectedOutput(format!(
            "expected [batch, seq_len, hidden] or [batch, hidden], got {:?}",
            shape
        ))),
    }
}

/// L2-normalizes in place; zero vectors are left untouched
pub fn l2_normalize(values: &mut [f32]) {
    let norm = values.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in values.iter_mut() {
            *value /= norm;
        }
    }
}
