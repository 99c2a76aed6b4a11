pub mod auctions;
