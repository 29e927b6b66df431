pub mod bnk;
