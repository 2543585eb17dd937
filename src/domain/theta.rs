// ============================================================
// Layer 3 — ParameterSet (Theta)
// ============================================================
// The full trainable state of the recursive autoencoder lives
// in ONE flat Vec<f64>. Every named matrix is a contiguous
// slice of that vector, interpreted through a ThetaLayout:
//
//   [ W1 | W2 | W3 | W4 | Wcat | b1 | b2 | b3 | bcat | We ]
//     H×V  H×V  V×H  V×H  C×H    H    V    V    C     E×D
//
// The solver only ever sees the flat vector; everything that
// needs structure (cost function, feature extractor) borrows
// ndarray views over it. No view owns data and no two views
// overlap, so the ranges always sum to the flat length.
//
// Reference: Socher et al. (2011) Semi-Supervised Recursive
//            Autoencoders for Predicting Sentiment Distributions
//            ndarray crate documentation (ArrayView)

use std::{fmt, ops::Range};

use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Half-width of the uniform range used for fresh embeddings.
const EMBEDDING_INIT_SCALE: f64 = 1e-3;

// ─── Dimensions ───────────────────────────────────────────────────────────────
/// The five scalars that fix the shape of every view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// E — length of one word embedding
    pub embedding_size:  usize,
    /// H — length of a parent (hidden) vector
    pub hidden_size:     usize,
    /// V — length of a child (visible) vector
    pub visible_size:    usize,
    /// C — number of categories the model predicts
    pub num_categories:  usize,
    /// D — number of rows in the dictionary
    pub dictionary_size: usize,
}

impl Dimensions {
    pub fn new(
        embedding_size:  usize,
        hidden_size:     usize,
        visible_size:    usize,
        num_categories:  usize,
        dictionary_size: usize,
    ) -> Self {
        Self { embedding_size, hidden_size, visible_size, num_categories, dictionary_size }
    }

    /// Total length L of the flat vector for these dimensions.
    pub fn num_params(&self) -> usize {
        ThetaLayout::new(self).total()
    }

    /// Whether the recursive encoder can run with these sizes. Parents are
    /// fed back in as children, so E, H and V must agree, and every size
    /// must be at least 1.
    pub fn check_supported(&self) -> Result<(), LayoutError> {
        let unsupported = |reason: String| Err(LayoutError::Unsupported { dims: *self, reason });

        if self.embedding_size == 0 {
            return unsupported("embedding size must be positive".into());
        }
        if self.hidden_size != self.embedding_size || self.visible_size != self.embedding_size {
            return unsupported("hidden and visible sizes must equal the embedding size".into());
        }
        if self.num_categories == 0 {
            return unsupported("at least one category is required".into());
        }
        if self.dictionary_size == 0 {
            return unsupported("the dictionary needs at least the unknown word".into());
        }
        Ok(())
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "E={} H={} V={} C={} D={}",
            self.embedding_size,
            self.hidden_size,
            self.visible_size,
            self.num_categories,
            self.dictionary_size,
        )
    }
}

// ─── Part ─────────────────────────────────────────────────────────────────────
/// Names of the structured views, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    W1,
    W2,
    W3,
    W4,
    WCat,
    B1,
    B2,
    B3,
    BCat,
    We,
}

impl Part {
    pub const ALL: [Part; 10] = [
        Part::W1,
        Part::W2,
        Part::W3,
        Part::W4,
        Part::WCat,
        Part::B1,
        Part::B2,
        Part::B3,
        Part::BCat,
        Part::We,
    ];

    /// (rows, cols) of this view. Bias vectors are single columns.
    pub fn shape(self, dims: &Dimensions) -> (usize, usize) {
        let h = dims.hidden_size;
        let v = dims.visible_size;
        match self {
            Part::W1 | Part::W2 => (h, v),
            Part::W3 | Part::W4 => (v, h),
            Part::WCat          => (dims.num_categories, h),
            Part::B1            => (h, 1),
            Part::B2 | Part::B3 => (v, 1),
            Part::BCat          => (dims.num_categories, 1),
            Part::We            => (dims.embedding_size, dims.dictionary_size),
        }
    }

    /// True for the weight matrices that carry L2 regularization.
    pub fn is_weight(self) -> bool {
        matches!(self, Part::W1 | Part::W2 | Part::W3 | Part::W4 | Part::WCat)
    }
}

// ─── ThetaLayout ──────────────────────────────────────────────────────────────
/// Offsets of every view inside the flat vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThetaLayout {
    ranges: [Range<usize>; 10],
}

impl ThetaLayout {
    pub fn new(dims: &Dimensions) -> Self {
        let mut offset = 0;
        let ranges = Part::ALL.map(|part| {
            let (rows, cols) = part.shape(dims);
            let range = offset..offset + rows * cols;
            offset = range.end;
            range
        });
        Self { ranges }
    }

    pub fn range(&self, part: Part) -> Range<usize> {
        self.ranges[part as usize].clone()
    }

    pub fn total(&self) -> usize {
        self.ranges.last().map_or(0, |r| r.end)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Part, Range<usize>)> + '_ {
        Part::ALL.into_iter().map(move |part| (part, self.range(part)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("flat vector has {got} values but {dims} requires {expected}")]
    Length {
        dims:     Dimensions,
        expected: usize,
        got:      usize,
    },

    #[error("cannot compose parameter sets with dimensions ({left}) and ({right})")]
    Incompatible { left: Dimensions, right: Dimensions },

    #[error("unsupported dimensions ({dims}): {reason}")]
    Unsupported { dims: Dimensions, reason: String },
}

// ─── ParameterSet ─────────────────────────────────────────────────────────────
/// Structured view over one flat parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    dims:   Dimensions,
    layout: ThetaLayout,
    theta:  Vec<f64>,
}

impl ParameterSet {
    /// All-zero parameters. Also used as a gradient accumulator.
    pub fn zeros(dims: Dimensions) -> Self {
        let layout = ThetaLayout::new(&dims);
        let theta  = vec![0.0; layout.total()];
        Self { dims, layout, theta }
    }

    /// Fresh parameters for the start of a training run.
    ///
    /// Weight matrices are drawn uniformly from ±sqrt(6 / (fan_in + fan_out + 1)),
    /// embeddings from ±1e-3, biases start at zero.
    pub fn random<R: Rng + ?Sized>(dims: Dimensions, rng: &mut R) -> Self {
        let mut params = Self::zeros(dims);

        for part in Part::ALL {
            let bound = match part {
                Part::W1 | Part::W2 | Part::W3 | Part::W4 => {
                    init_bound(dims.hidden_size, dims.visible_size)
                }
                Part::WCat => init_bound(dims.num_categories, dims.hidden_size),
                Part::We   => EMBEDDING_INIT_SCALE,
                _          => continue,
            };

            let range = params.layout.range(part);
            for value in &mut params.theta[range] {
                *value = rng.gen_range(-bound..=bound);
            }
        }

        params
    }

    /// Wrap an existing flat vector. Fails if its length disagrees with `dims`.
    pub fn from_flat(dims: Dimensions, theta: Vec<f64>) -> Result<Self, LayoutError> {
        let layout = ThetaLayout::new(&dims);
        if theta.len() != layout.total() {
            return Err(LayoutError::Length {
                dims,
                expected: layout.total(),
                got:      theta.len(),
            });
        }
        Ok(Self { dims, layout, theta })
    }

    /// Turn a solver iterate into the trained model.
    ///
    /// The solver optimizes the embedding view as a delta on top of the
    /// initial embeddings, so the final embeddings are
    /// `solved.We + initial.We`. All other views are taken from `solved`.
    pub fn compose(initial: &ParameterSet, solved: ParameterSet) -> Result<Self, LayoutError> {
        if initial.dims != solved.dims {
            return Err(LayoutError::Incompatible {
                left:  initial.dims,
                right: solved.dims,
            });
        }

        let mut composed = solved;
        let range = composed.layout.range(Part::We);
        for (dst, src) in composed.theta[range.clone()]
            .iter_mut()
            .zip(&initial.theta[range])
        {
            *dst += src;
        }
        Ok(composed)
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    pub fn layout(&self) -> &ThetaLayout {
        &self.layout
    }

    pub fn num_categories(&self) -> usize {
        self.dims.num_categories
    }

    /// L, the flat vector length.
    pub fn len(&self) -> usize {
        self.theta.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.theta
    }

    pub fn into_flat(self) -> Vec<f64> {
        self.theta
    }

    pub fn matrix(&self, part: Part) -> ArrayView2<'_, f64> {
        ArrayView2::from_shape(part.shape(&self.dims), &self.theta[self.layout.range(part)])
            .expect("layout ranges match part shapes")
    }

    pub fn matrix_mut(&mut self, part: Part) -> ArrayViewMut2<'_, f64> {
        let range = self.layout.range(part);
        ArrayViewMut2::from_shape(part.shape(&self.dims), &mut self.theta[range])
            .expect("layout ranges match part shapes")
    }

    /// Flat view of any part; natural for the bias vectors.
    pub fn vector(&self, part: Part) -> ArrayView1<'_, f64> {
        ArrayView1::from(&self.theta[self.layout.range(part)])
    }

    pub fn vector_mut(&mut self, part: Part) -> ArrayViewMut1<'_, f64> {
        let range = self.layout.range(part);
        ArrayViewMut1::from(&mut self.theta[range])
    }

    /// The E×D embedding matrix; column j embeds word j.
    pub fn embeddings(&self) -> ArrayView2<'_, f64> {
        self.matrix(Part::We)
    }
}

fn init_bound(fan_in: usize, fan_out: usize) -> f64 {
    (6.0 / (fan_in + fan_out + 1) as f64).sqrt()
}
