pub mod freecurrency;

pub use freecurrency::FreeCurrencyClient;
