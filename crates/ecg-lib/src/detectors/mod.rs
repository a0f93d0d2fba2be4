pub mod ecg;
