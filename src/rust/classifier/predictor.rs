use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::argmax;
use crate::Category;

/// Maps a feature vector to exactly one category.
///
/// Implementations are deterministic and read-only after construction.
pub trait Predictor: Send + Sync {
    /// Expected width of the feature vectors passed to `predict`
    fn num_features(&self) -> usize;

    /// Predicts the category for a feature vector of width `num_features()`
    ///
    /// # Errors
    /// - `PredictionError` if the vector has the wrong width
    fn predict(&self, features: &Array1<f32>) -> Result<Category, ClassifierError>;

    /// Categories this predictor can produce
    fn classes(&self) -> Vec<Category>;
}

/// On-disk layout of a linear model.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LinearModelFile {
    classes: Vec<Category>,
    coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
}

/// A linear model predicting the class with the highest score.
///
/// Two weight layouts are accepted:
/// - one weight row and intercept per class, predicting the arg-max class
///   (multinomial logistic regression, one-vs-rest linear SVMs, multinomial
///   naive Bayes with log likelihoods as weights and log priors as intercepts)
/// - for exactly two classes, a single weight row and intercept scoring the
///   second class: a positive score picks `classes[1]`, anything else
///   `classes[0]` (binary logistic regression or SVM)
///
/// Ties go to the class listed first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "LinearModelFile", into = "LinearModelFile")]
pub struct LinearModel {
    classes: Vec<Category>,
    coef: Array2<f32>,
    intercept: Array1<f32>,
}

impl LinearModel {
    /// Creates a model from its classes, a `classes x features` weight matrix
    /// and one intercept per class, or for two classes a `1 x features`
    /// matrix and a single intercept.
    ///
    /// # Errors
    /// - `ValidationError` if there are no classes or a class is listed twice
    /// - `ValidationError` if the weight matrix or intercepts do not match the classes
    /// - `ValidationError` if the model has no features
    /// - `ValidationError` if a weight or intercept is NaN or infinite
    pub fn new(
        classes: Vec<Category>,
        coef: Array2<f32>,
        intercept: Array1<f32>,
    ) -> Result<Self, ClassifierError> {
        if classes.is_empty() {
            return Err(ClassifierError::ValidationError("Model must have at least one class".into()));
        }
        if let Some(pos) = classes.iter().enumerate().position(|(i, c)| classes[..i].contains(c)) {
            return Err(ClassifierError::ValidationError(format!(
                "Class '{}' is listed more than once",
                classes[pos]
            )));
        }
        let binary = classes.len() == 2 && coef.nrows() == 1;
        if coef.nrows() != classes.len() && !binary {
            return Err(ClassifierError::ValidationError(format!(
                "Weight matrix has {} rows for {} classes",
                coef.nrows(),
                classes.len()
            )));
        }
        if coef.ncols() == 0 {
            return Err(ClassifierError::ValidationError("Model must have at least one feature".into()));
        }
        if intercept.len() != coef.nrows() {
            return Err(ClassifierError::ValidationError(format!(
                "Got {} intercepts for {} weight rows",
                intercept.len(),
                coef.nrows()
            )));
        }
        if let Some(((row, col), _)) = coef.indexed_iter().find(|(_, w)| !w.is_finite()) {
            return Err(ClassifierError::ValidationError(format!(
                "Weight at row {}, column {} is not finite",
                row, col
            )));
        }
        if let Some(pos) = intercept.iter().position(|b| !b.is_finite()) {
            return Err(ClassifierError::ValidationError(format!(
                "Intercept {} is not finite",
                pos
            )));
        }
        Ok(Self { classes, coef, intercept })
    }

    /// True when a single weight row separates two classes
    pub fn is_binary(&self) -> bool {
        self.coef.nrows() == 1 && self.classes.len() == 2
    }

    /// Raw scores, one per weight row. For a binary model this is a single
    /// score for `classes()[1]`.
    ///
    /// # Errors
    /// - `PredictionError` if `features` is not `num_features()` wide
    pub fn decision_function(&self, features: &Array1<f32>) -> Result<Array1<f32>, ClassifierError> {
        if features.len() != self.coef.ncols() {
            return Err(ClassifierError::PredictionError(format!(
                "Expected {} features, got {}",
                self.coef.ncols(),
                features.len()
            )));
        }
        Ok(self.coef.dot(features) + &self.intercept)
    }
}

impl TryFrom<LinearModelFile> for LinearModel {
    type Error = ClassifierError;

    fn try_from(file: LinearModelFile) -> Result<Self, Self::Error> {
        let rows = file.coef.len();
        let cols = file.coef.first().map_or(0, Vec::len);
        if let Some(pos) = file.coef.iter().position(|row| row.len() != cols) {
            return Err(ClassifierError::ValidationError(format!(
                "Weight row {} has {} entries, expected {}",
                pos,
                file.coef[pos].len(),
                cols
            )));
        }
        let flat: Vec<f32> = file.coef.into_iter().flatten().collect();
        let coef = Array2::from_shape_vec((rows, cols), flat)
            .map_err(|e| ClassifierError::ValidationError(format!("Invalid weight matrix: {}", e)))?;

        Self::new(file.classes, coef, Array1::from(file.intercept))
    }
}

impl From<LinearModel> for LinearModelFile {
    fn from(model: LinearModel) -> Self {
        Self {
            classes: model.classes,
            coef: model.coef.outer_iter().map(|row| row.to_vec()).collect(),
            intercept: model.intercept.to_vec(),
        }
    }
}

impl Predictor for LinearModel {
    fn num_features(&self) -> usize {
        self.coef.ncols()
    }

    fn predict(&self, features: &Array1<f32>) -> Result<Category, ClassifierError> {
        let scores = self.decision_function(features)?;
        if self.is_binary() {
            let positive = scores[0] > 0.0;
            return Ok(self.classes[usize::from(positive)]);
        }
        // classes is non-empty, so argmax always finds an index
        Ok(argmax(&scores)
            .map(|i| self.classes[i])
            .unwrap_or(self.classes[0]))
    }

    fn classes(&self) -> Vec<Category> {
        self.classes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn setup_model() -> LinearModel {
        LinearModel::new(
            vec![Category::Financial, Category::General, Category::Hr],
            array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]],
            array![0.0, 0.1, 0.0],
        )
        .unwrap()
    }

    #[test]
    fn test_predict_picks_highest_score() {
        let model = setup_model();
        assert_eq!(model.predict(&array![1.0, 0.0]), Ok(Category::Financial));
        assert_eq!(model.predict(&array![0.0, 1.0]), Ok(Category::General));
    }

    #[test]
    fn test_intercept_breaks_zero_vector() {
        assert_eq!(setup_model().predict(&array![0.0, 0.0]), Ok(Category::General));
    }

    #[test]
    fn test_ties_go_to_first_class() {
        let model = LinearModel::new(
            vec![Category::Hr, Category::Urgent],
            array![[1.0], [1.0]],
            array![0.0, 0.0],
        )
        .unwrap();
        assert_eq!(model.predict(&array![1.0]), Ok(Category::Hr));
    }

    #[test]
    fn test_wrong_width_is_a_prediction_error() {
        let model = setup_model();
        assert!(matches!(
            model.predict(&array![1.0, 0.0, 0.0]),
            Err(ClassifierError::PredictionError(_))
        ));
        assert!(matches!(
            model.decision_function(&array![1.0]),
            Err(ClassifierError::PredictionError(_))
        ));
    }

    #[test]
    fn test_binary_layout_scores_second_class() {
        let model = LinearModel::new(
            vec![Category::General, Category::Financial],
            array![[2.0, -1.0]],
            array![-0.5],
        )
        .unwrap();
        assert!(model.is_binary());
        assert_eq!(model.num_features(), 2);
        assert_eq!(model.predict(&array![1.0, 0.0]), Ok(Category::Financial));
        assert_eq!(model.predict(&array![0.0, 1.0]), Ok(Category::General));
        // a zero score is a tie and goes to the first class
        assert_eq!(model.predict(&array![0.25, 0.0]), Ok(Category::General));
    }

    #[test]
    fn test_single_row_needs_exactly_two_classes() {
        let three = LinearModel::new(
            vec![Category::General, Category::Financial, Category::Hr],
            Array2::zeros((1, 2)),
            Array1::zeros(1),
        );
        assert!(matches!(three, Err(ClassifierError::ValidationError(_))));

        let binary_with_two_intercepts = LinearModel::new(
            vec![Category::General, Category::Financial],
            Array2::zeros((1, 2)),
            Array1::zeros(2),
        );
        assert!(matches!(binary_with_two_intercepts, Err(ClassifierError::ValidationError(_))));
    }

    #[test]
    fn test_rejects_non_finite_parameters() {
        let classes = vec![Category::Financial, Category::General];
        let nan_weight = LinearModel::new(classes.clone(), array![[f32::NAN], [0.0]], array![0.0, 0.0]);
        assert!(matches!(nan_weight, Err(ClassifierError::ValidationError(_))));

        let inf_weight = LinearModel::new(classes.clone(), array![[1.0], [f32::NEG_INFINITY]], array![0.0, 0.0]);
        assert!(matches!(inf_weight, Err(ClassifierError::ValidationError(_))));

        let inf_intercept = LinearModel::new(classes, array![[1.0], [0.0]], array![0.0, f32::INFINITY]);
        assert!(matches!(inf_intercept, Err(ClassifierError::ValidationError(_))));
    }

    #[test]
    fn test_shape_validation() {
        assert!(LinearModel::new(vec![], Array2::zeros((0, 1)), Array1::zeros(0)).is_err());
        assert!(LinearModel::new(vec![Category::Hr], Array2::zeros((2, 1)), Array1::zeros(1)).is_err());
        assert!(LinearModel::new(vec![Category::Hr], Array2::zeros((1, 0)), Array1::zeros(1)).is_err());
        assert!(LinearModel::new(vec![Category::Hr], Array2::zeros((1, 1)), Array1::zeros(2)).is_err());
        assert!(LinearModel::new(
            vec![Category::Hr, Category::Hr],
            Array2::zeros((2, 1)),
            Array1::zeros(2)
        )
        .is_err());
    }

    #[test]
    fn test_deserialize_model_file() {
        let json = r#"{
            "classes": ["Urgent", "General"],
            "coef": [[2.0, 0.0], [0.0, 1.0]],
            "intercept": [0.0, 0.0]
        }"#;
        let model: LinearModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.num_features(), 2);
        assert_eq!(model.classes(), vec![Category::Urgent, Category::General]);
        assert_eq!(model.predict(&array![0.1, 0.9]), Ok(Category::General));
    }

    #[test]
    fn test_deserialize_binary_model_file() {
        let json = r#"{
            "classes": ["General", "HR"],
            "coef": [[-1.0, 3.0]],
            "intercept": [0.0]
        }"#;
        let model: LinearModel = serde_json::from_str(json).unwrap();
        assert!(model.is_binary());
        assert_eq!(model.classes(), vec![Category::General, Category::Hr]);
        assert_eq!(model.predict(&array![0.0, 1.0]), Ok(Category::Hr));
        assert_eq!(model.predict(&array![1.0, 0.0]), Ok(Category::General));

        let saved = serde_json::to_string(&model).unwrap();
        let reloaded: LinearModel = serde_json::from_str(&saved).unwrap();
        assert!(reloaded.is_binary());
    }

    #[test]
    fn test_deserialize_rejects_unknown_label_and_ragged_rows() {
        let unknown = r#"{"classes": ["Spam"], "coef": [[1.0]], "intercept": [0.0]}"#;
        assert!(serde_json::from_str::<LinearModel>(unknown).is_err());

        let ragged = r#"{"classes": ["HR", "General"], "coef": [[1.0, 2.0], [1.0]], "intercept": [0.0, 0.0]}"#;
        assert!(serde_json::from_str::<LinearModel>(ragged).is_err());

        // JSON has no NaN literal, but an overflowing number parses to infinity
        let overflow = r#"{"classes": ["HR", "General"], "coef": [[1e39], [1.0]], "intercept": [0.0, 0.0]}"#;
        assert!(serde_json::from_str::<LinearModel>(overflow).is_err());
    }
}
