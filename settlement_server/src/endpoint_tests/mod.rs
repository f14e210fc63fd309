mod helpers;
mod mocks;
mod payments;
mod wallets;
mod webhook;
