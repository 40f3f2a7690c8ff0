mod forms_tests;
mod inventory_tests;
mod receipts_tests;
