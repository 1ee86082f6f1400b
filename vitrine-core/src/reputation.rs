//! Reputation aggregation
//!
//! Pure computation over the review list. The repository invokes
//! [`aggregate`] inside every review append so the stored
//! `(rating, review_count)` pair always equals the recomputed value.

use crate::{Error, Review, error::ValidationError};

/// Inclusive bounds on an acceptable review rating.
pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// Validate a single review before it touches any stored state.
///
/// The rating must be finite and within [`MIN_RATING`]..=[`MAX_RATING`],
/// and the reviewer name must be present.
pub fn validate_review(review: &Review) -> Result<(), Error> {
    if review.name.is_empty() {
        return Err(ValidationError::MissingField("name".to_string()).into());
    }
    if !review.rating.is_finite() {
        return Err(ValidationError::InvalidRating(format!("{}", review.rating)).into());
    }
    if review.rating < MIN_RATING || review.rating > MAX_RATING {
        return Err(ValidationError::InvalidRating(format!(
            "{} is outside {MIN_RATING}..={MAX_RATING}",
            review.rating
        ))
        .into());
    }
    Ok(())
}

/// Compute `(rating, count)` for a review list.
///
/// `count` is the list length. `rating` is the mean of the review
/// ratings rounded to one fractional digit, or 0.0 for an empty list.
/// Rounding is round-half-away-from-zero (`f64::round` semantics);
/// this is an observable contract shared by both storage backends.
pub fn aggregate(reviews: &[Review]) -> Result<(f64, u32), Error> {
    if reviews.is_empty() {
        return Ok((0.0, 0));
    }

    let mut total = 0.0;
    for review in reviews {
        validate_review(review)?;
        total += review.rating;
    }

    let count = reviews.len() as u32;
    let rating = (total / count as f64 * 10.0).round() / 10.0;

    Ok((rating, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: f64) -> Review {
        Review {
            rating,
            name: "Reviewer".to_string(),
            comment: None,
            date: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_empty_list_is_zero() {
        assert_eq!(aggregate(&[]).unwrap(), (0.0, 0));
    }

    #[test]
    fn test_mean_rounded_to_one_decimal() {
        let reviews = vec![review(5.0), review(4.0), review(3.0)];
        assert_eq!(aggregate(&reviews).unwrap(), (4.0, 3));

        let reviews = vec![review(5.0), review(4.0), review(3.0), review(2.0)];
        assert_eq!(aggregate(&reviews).unwrap(), (3.5, 4));
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        // mean = 4.35 -> 4.4
        let reviews = vec![review(4.4), review(4.3)];
        assert_eq!(aggregate(&reviews).unwrap().0, 4.4);

        // mean = 4.25 -> 4.3
        let reviews = vec![review(4.5), review(4.0)];
        assert_eq!(aggregate(&reviews).unwrap().0, 4.3);
    }

    #[test]
    fn test_rejects_non_finite_rating() {
        let reviews = vec![review(f64::NAN)];
        assert!(matches!(
            aggregate(&reviews),
            Err(Error::Validation(ValidationError::InvalidRating(_)))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_rating() {
        assert!(validate_review(&review(0.0)).is_err());
        assert!(validate_review(&review(5.5)).is_err());
        assert!(validate_review(&review(1.0)).is_ok());
        assert!(validate_review(&review(5.0)).is_ok());
    }

    #[test]
    fn test_rejects_missing_reviewer_name() {
        let mut r = review(4.0);
        r.name = String::new();
        assert!(matches!(
            validate_review(&r),
            Err(Error::Validation(ValidationError::MissingField(_)))
        ));
    }
}
