mod quadratic_tests;
