//! Harmonic Token Projection (HTP) embedder
//!
//! Deterministic, training-free embeddings following "Harmonic Token
//! Projection" (https://arxiv.org/html/2511.20665). Each token is read as a
//! base-2^16 integer, reduced modulo a run of primes, and every residue is
//! projected onto the unit circle. Token vectors are mean-pooled and L2
//! normalized.
//!
//! There is no semantics beyond shared tokens, but it needs no network or
//! model files, which makes it the fallback when no API key is configured.

use std::f64::consts::PI;

use async_trait::async_trait;

use super::{EmbeddingGenerator, GeneratorError};

/// Embedding dimension (two components per modulus)
pub const HTP_DIMENSIONS: usize = 384;

pub const HTP_MODEL: &str = "htp-384";

/// Tokens longer than this are truncated (Unicode scalar values)
const MAX_TOKEN_CHARS: usize = 64;

#[derive(Debug, Clone)]
pub struct HarmonicEmbedder {
    moduli: Vec<u64>,
}

impl HarmonicEmbedder {
    pub fn new() -> Self {
        Self {
            moduli: first_primes(HTP_DIMENSIONS / 2),
        }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return vec![0.0; HTP_DIMENSIONS];
        }

        let mut pooled = vec![0.0f64; HTP_DIMENSIONS];
        for token in &tokens {
            let n = token_to_integer(token);
            for (i, &m) in self.moduli.iter().enumerate() {
                let theta = 2.0 * PI * ((n % m) as f64) / (m as f64);
                pooled[2 * i] += theta.sin();
                pooled[2 * i + 1] += theta.cos();
            }
        }

        let count = tokens.len() as f64;
        pooled.iter_mut().for_each(|v| *v /= count);

        let norm = pooled.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            pooled.iter().map(|x| (x / norm) as f32).collect()
        } else {
            pooled.iter().map(|x| *x as f32).collect()
        }
    }
}

impl Default for HarmonicEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingGenerator for HarmonicEmbedder {
    async fn generate(&self, text: &str) -> Result<Vec<f32>, GeneratorError> {
        Ok(self.embed(text))
    }

    fn model_name(&self) -> &str {
        HTP_MODEL
    }
}

fn first_primes(count: usize) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::with_capacity(count);
    let mut candidate = 2u64;
    while primes.len() < count {
        if primes
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0)
        {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}

/// Lowercased words split on whitespace and ASCII punctuation
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// N = sum(u_j * 2^16^(L-j)), wrapping on overflow
fn token_to_integer(token: &str) -> u64 {
    token
        .chars()
        .take(MAX_TOKEN_CHARS)
        .fold(0u64, |n, c| n.wrapping_mul(65536).wrapping_add(c as u64))
}
