/// Represents the parameters of the threshold scheme.
///
/// `t + 1` shares are needed to reconstruct, so `t` ranges over `0..n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameters {
    /// Number of parties
    pub n: u32,
    /// Threshold, which is also the degree of every dealt polynomial
    pub t: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, displaydoc::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum Error {
    /// Number of parties is invalid
    InvalidNumberOfParties,
    /// Threshold {t} leaves fewer than t+1 of {n} parties to reconstruct
    ThresholdTooLarge { t: u32, n: u32 },
}

impl Parameters {
    /// Create a new set of parameters
    pub fn new(n: u32, t: u32) -> Self {
        Self { n, t }
    }

    /// Validate the parameters
    pub fn validate(&self) -> Result<(), Error> {
        if self.n == 0 {
            return Err(Error::InvalidNumberOfParties);
        }
        if self.t >= self.n {
            return Err(Error::ThresholdTooLarge { t: self.t, n: self.n });
        }
        Ok(())
    }

    /// Number of shares needed to reconstruct the joint secret.
    pub fn quorum(&self) -> u32 {
        self.t + 1
    }

    /// Number of coefficients of every commitment polynomial.
    pub fn commitment_len(&self) -> usize {
        self.t as usize + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation() {
        assert_eq!(Parameters::new(0, 0).validate(), Err(Error::InvalidNumberOfParties));
        assert_eq!(Parameters::new(3, 3).validate(), Err(Error::ThresholdTooLarge { t: 3, n: 3 }));
        assert!(Parameters::new(1, 0).validate().is_ok());
        assert!(Parameters::new(3, 1).validate().is_ok());
        assert!(Parameters::new(3, 2).validate().is_ok());
        assert_eq!(Parameters::new(3, 1).quorum(), 2);
        assert_eq!(Parameters::new(3, 1).commitment_len(), 2);
    }
}
